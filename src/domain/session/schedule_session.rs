use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::time_window::TimeWindow;
use crate::domain::utils::id::{AcademicYearId, CurriculumSubjectId, InstructorId, RoomId, SemesterId, SessionId, UserId};
use crate::error::ValidationError;

/// The (academic year, semester) pair every piece of schedule data is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    pub academic_year_id: AcademicYearId,
    pub semester_id: SemesterId,
}

impl Term {
    pub fn new(academic_year_id: i64, semester_id: i64) -> Self {
        Term { academic_year_id: AcademicYearId::new(academic_year_id), semester_id: SemesterId::new(semester_id) }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AY {} / Sem {}", self.academic_year_id, self.semester_id)
    }
}

/// Cohort of students sharing a subject offering, identified by block and batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Section {
    pub block: i64,
    pub batch: i64,
}

/// Kind of meeting. Lecture and laboratory meetings of one subject are booked separately.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassType {
    Lecture,
    Laboratory,
    Other(String),
}

impl FromStr for ClassType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();

        match normalized.as_str() {
            "" => Err(ValidationError::InvalidClassType(value.to_string())),
            "lecture" | "lec" => Ok(ClassType::Lecture),
            "laboratory" | "lab" => Ok(ClassType::Laboratory),
            _ => Ok(ClassType::Other(normalized)),
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassType::Lecture => write!(f, "lecture"),
            ClassType::Laboratory => write!(f, "laboratory"),
            ClassType::Other(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for ClassType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClassType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A proposed session that has passed field validation and time normalization
/// but is not yet part of the timetable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSession {
    pub term: Term,
    pub subject: CurriculumSubjectId,
    pub room: Option<RoomId>,
    pub instructor: Option<InstructorId>,
    /// `None` for a session without day and time.
    pub window: Option<TimeWindow>,
    pub section: Section,
    pub class_type: ClassType,
    pub last_updated_by: UserId,
}

impl CandidateSession {
    /// Identity used by the duplicate rule: one meeting per subject, section and class type per term.
    pub fn section_key(&self) -> SectionKey {
        SectionKey { term: self.term, subject: self.subject, section: self.section, class_type: self.class_type.clone() }
    }
}

/// A session committed to the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSession {
    pub id: SessionId,
    pub term: Term,
    pub subject: CurriculumSubjectId,
    pub room: Option<RoomId>,
    pub instructor: Option<InstructorId>,
    pub window: Option<TimeWindow>,
    pub section: Section,
    pub class_type: ClassType,
    pub last_updated_by: UserId,
}

impl ScheduleSession {
    pub fn from_candidate(id: SessionId, candidate: CandidateSession) -> Self {
        ScheduleSession {
            id,
            term: candidate.term,
            subject: candidate.subject,
            room: candidate.room,
            instructor: candidate.instructor,
            window: candidate.window,
            section: candidate.section,
            class_type: candidate.class_type,
            last_updated_by: candidate.last_updated_by,
        }
    }

    /// The session's current state as a candidate, the starting point of an update.
    pub fn to_candidate(&self) -> CandidateSession {
        CandidateSession {
            term: self.term,
            subject: self.subject,
            room: self.room,
            instructor: self.instructor,
            window: self.window,
            section: self.section,
            class_type: self.class_type.clone(),
            last_updated_by: self.last_updated_by,
        }
    }

    pub fn section_key(&self) -> SectionKey {
        SectionKey { term: self.term, subject: self.subject, section: self.section, class_type: self.class_type.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionKey {
    pub term: Term,
    pub subject: CurriculumSubjectId,
    pub section: Section,
    pub class_type: ClassType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_type_parsing_is_case_insensitive() {
        assert_eq!("Lecture".parse::<ClassType>().unwrap(), ClassType::Lecture);
        assert_eq!(" LAB ".parse::<ClassType>().unwrap(), ClassType::Laboratory);
        assert_eq!("Seminar".parse::<ClassType>().unwrap(), ClassType::Other("seminar".to_string()));
        assert!("  ".parse::<ClassType>().is_err());
    }

    #[test]
    fn section_key_ignores_room_instructor_and_time() {
        let candidate = CandidateSession {
            term: Term::new(2020, 1),
            subject: CurriculumSubjectId::new(5),
            room: Some(RoomId::new(3)),
            instructor: None,
            window: None,
            section: Section { block: 1, batch: 1 },
            class_type: ClassType::Lecture,
            last_updated_by: UserId::new(1),
        };
        let mut moved = candidate.clone();
        moved.room = Some(RoomId::new(4));
        moved.instructor = Some(InstructorId::new(9));

        assert_eq!(candidate.section_key(), moved.section_key());
    }
}
