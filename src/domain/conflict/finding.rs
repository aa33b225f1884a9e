use chrono::Weekday;
use serde::Serialize;

use crate::domain::session::schedule_session::ScheduleSession;
use crate::domain::time_window::TimeWindow;
use crate::domain::utils::id::{CurriculumSubjectId, InstructorId, RoomId, SessionId};

/// One detected reason why a candidate session cannot enter the timetable.
///
/// Where several stored sessions conflict only the first (lowest id) is described;
/// `total` tells how many there were.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConflictFinding {
    RoomConflict { room: RoomId, conflicting_window: TimeWindow, existing_session: SessionId, total: usize },

    DuplicateConflict { existing_session: Box<ScheduleSession> },

    InstructorConflict { instructor: InstructorId, instructor_name: Option<String>, kind: InstructorConflictKind },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstructorConflictKind {
    /// The subject is not among the instructor's preferred subjects for the term.
    NotPreferred { subject: CurriculumSubjectId },

    /// The session leaves the instructor's declared window for that day.
    OutsideAvailability { available: TimeWindow },

    /// The instructor already teaches an overlapping session.
    DoubleBooked { existing_session: SessionId, conflicting_window: TimeWindow, total: usize },

    /// No availability is declared for the day. Only reported when explicit availability is required.
    MissingAvailability { weekday: Option<Weekday> },
}

/// Coarse grouping of findings, used for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingCategory {
    Room,
    Duplicate,
    Instructor,
}

impl ConflictFinding {
    pub fn category(&self) -> FindingCategory {
        match self {
            ConflictFinding::RoomConflict { .. } => FindingCategory::Room,
            ConflictFinding::DuplicateConflict { .. } => FindingCategory::Duplicate,
            ConflictFinding::InstructorConflict { .. } => FindingCategory::Instructor,
        }
    }

    pub fn instructor_kind(&self) -> Option<&InstructorConflictKind> {
        match self {
            ConflictFinding::InstructorConflict { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// Number of findings per category, in (room, duplicate, instructor) order.
pub fn count_by_category(findings: &[ConflictFinding]) -> (usize, usize, usize) {
    findings.iter().fold((0, 0, 0), |(room, duplicate, instructor), finding| match finding.category() {
        FindingCategory::Room => (room + 1, duplicate, instructor),
        FindingCategory::Duplicate => (room, duplicate + 1, instructor),
        FindingCategory::Instructor => (room, duplicate, instructor + 1),
    })
}
