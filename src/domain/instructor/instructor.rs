use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::session::schedule_session::Term;
use crate::domain::time_window::TimeWindow;
use crate::domain::utils::id::{CurriculumSubjectId, InstructorId, SubjectId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: InstructorId,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
}

impl Instructor {
    /// `First Last`, the form used in conflict messages.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Instructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Declared teaching hours of an instructor on one weekday of a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructorAvailability {
    pub instructor: InstructorId,
    pub term: Term,
    pub weekday: Weekday,
    pub window: TimeWindow,
    pub active: bool,
}

/// A catalogue subject an instructor is willing to teach in a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructorPreferredSubject {
    pub instructor: InstructorId,
    pub term: Term,
    pub subject: SubjectId,
    pub active: bool,
}

/// Placement of a catalogue subject inside a curriculum. Sessions reference the
/// curriculum subject, preferences reference the catalogue subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurriculumSubject {
    pub id: CurriculumSubjectId,
    pub subject: SubjectId,
}
