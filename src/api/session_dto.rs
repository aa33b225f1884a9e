use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::session::schedule_session::{CandidateSession, ClassType, ScheduleSession, Section, Term};
use crate::domain::session::session_patch::SessionPatch;
use crate::domain::time_window::{TimeWindow, format_24h, parse_time_of_day, parse_weekday, weekday_name};
use crate::domain::utils::id::{CurriculumSubjectId, InstructorId, RoomId, SessionId, UserId};
use crate::error::ValidationError;

/// Inbound payload of a schedule request, as entered by a person.
///
/// Every field is optional at the serde level so that a missing field surfaces as a
/// `ValidationError` naming it instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRequestDto {
    pub day: Option<String>,
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub subject_id: Option<i64>,
    pub room_id: Option<i64>,
    pub instructor_id: Option<i64>,
    pub block: Option<i64>,
    pub batch: Option<i64>,
    pub class_type: Option<String>,
    pub academic_year_id: Option<i64>,
    pub semester_id: Option<i64>,
}

fn required<T: Copy>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

impl SessionRequestDto {
    /// Validates the payload and normalizes its times into a canonical window.
    pub fn normalize(&self, acting_user: UserId) -> Result<CandidateSession, ValidationError> {
        let term = Term::new(required(self.academic_year_id, "academic_year_id")?, required(self.semester_id, "semester_id")?);
        let subject = CurriculumSubjectId::new(required(self.subject_id, "subject_id")?);
        let section = Section { block: required(self.block, "block")?, batch: required(self.batch, "batch")? };
        let class_type: ClassType = self.class_type.as_deref().ok_or(ValidationError::MissingField("class_type"))?.parse()?;

        let window = TimeWindow::normalize(self.day.as_deref(), self.time_start.as_deref(), self.time_end.as_deref())?;

        Ok(CandidateSession {
            term,
            subject,
            room: self.room_id.map(RoomId::new),
            instructor: self.instructor_id.map(InstructorId::new),
            window,
            section,
            class_type,
            last_updated_by: acting_user,
        })
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Inbound payload of a session update. Absent fields keep their stored value,
/// `null` clears a nullable field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPatchDto {
    #[serde(default, deserialize_with = "double_option")]
    pub day: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub time_start: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub time_end: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub room_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub instructor_id: Option<Option<i64>>,
    #[serde(default)]
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub block: Option<i64>,
    #[serde(default)]
    pub batch: Option<i64>,
    #[serde(default)]
    pub class_type: Option<String>,
}

impl SessionPatchDto {
    pub fn normalize(&self) -> Result<SessionPatch, ValidationError> {
        let weekday = match &self.day {
            Some(Some(day)) => Some(Some(parse_weekday(day)?)),
            Some(None) => Some(None),
            None => None,
        };

        let start = match &self.time_start {
            Some(Some(value)) => Some(Some(parse_time_of_day("time_start", value)?)),
            Some(None) => Some(None),
            None => None,
        };

        let end = match &self.time_end {
            Some(Some(value)) => Some(Some(parse_time_of_day("time_end", value)?)),
            Some(None) => Some(None),
            None => None,
        };

        Ok(SessionPatch {
            subject: self.subject_id.map(CurriculumSubjectId::new),
            room: self.room_id.map(|room| room.map(RoomId::new)),
            instructor: self.instructor_id.map(|instructor| instructor.map(InstructorId::new)),
            weekday,
            start,
            end,
            block: self.block,
            batch: self.batch,
            class_type: self.class_type.as_deref().map(str::parse::<ClassType>).transpose()?,
        })
    }
}

/// A committed session as it leaves the crate, and as it is stored in a timetable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSessionDto {
    pub id: i64,
    pub academic_year_id: i64,
    pub semester_id: i64,
    pub subject_id: i64,
    pub room_id: Option<i64>,
    pub instructor_id: Option<i64>,
    pub day: Option<String>,
    /// `HH:MM`
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub block: i64,
    pub batch: i64,
    pub class_type: String,
    pub last_updated_by: i64,
}

impl From<&ScheduleSession> for ScheduleSessionDto {
    fn from(session: &ScheduleSession) -> Self {
        ScheduleSessionDto {
            id: session.id.value(),
            academic_year_id: session.term.academic_year_id.value(),
            semester_id: session.term.semester_id.value(),
            subject_id: session.subject.value(),
            room_id: session.room.map(|room| room.value()),
            instructor_id: session.instructor.map(|instructor| instructor.value()),
            day: session.window.and_then(|window| window.weekday).map(|day: Weekday| weekday_name(day).to_string()),
            time_start: session.window.map(|window| format_24h(window.start)),
            time_end: session.window.map(|window| format_24h(window.end)),
            block: session.section.block,
            batch: session.section.batch,
            class_type: session.class_type.to_string(),
            last_updated_by: session.last_updated_by.value(),
        }
    }
}

impl TryFrom<ScheduleSessionDto> for ScheduleSession {
    type Error = ValidationError;

    fn try_from(dto: ScheduleSessionDto) -> Result<Self, Self::Error> {
        Ok(ScheduleSession {
            id: SessionId::new(dto.id),
            term: Term::new(dto.academic_year_id, dto.semester_id),
            subject: CurriculumSubjectId::new(dto.subject_id),
            room: dto.room_id.map(RoomId::new),
            instructor: dto.instructor_id.map(InstructorId::new),
            window: TimeWindow::normalize(dto.day.as_deref(), dto.time_start.as_deref(), dto.time_end.as_deref())?,
            section: Section { block: dto.block, batch: dto.batch },
            class_type: dto.class_type.parse()?,
            last_updated_by: UserId::new(dto.last_updated_by),
        })
    }
}
