use chrono::{NaiveTime, Weekday};

use crate::domain::conflict::detector_trait::DetectorKind;
use crate::domain::session::schedule_session::{CandidateSession, ClassType, ScheduleSession, Section};
use crate::domain::time_window::TimeWindow;
use crate::domain::utils::id::{CurriculumSubjectId, InstructorId, RoomId, UserId};
use crate::error::ValidationError;

/// Partial change to a committed session.
///
/// Nullable fields use `Option<Option<T>>`: the outer `None` keeps the stored value,
/// `Some(None)` clears it, `Some(Some(v))` replaces it. The term cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub subject: Option<CurriculumSubjectId>,
    pub room: Option<Option<RoomId>>,
    pub instructor: Option<Option<InstructorId>>,
    pub weekday: Option<Option<Weekday>>,
    pub start: Option<Option<NaiveTime>>,
    pub end: Option<Option<NaiveTime>>,
    pub block: Option<i64>,
    pub batch: Option<i64>,
    pub class_type: Option<ClassType>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        *self == SessionPatch::default()
    }

    fn touches_window(&self) -> bool {
        self.weekday.is_some() || self.start.is_some() || self.end.is_some()
    }

    /// Whether the patch changes any input of the given detector. Detectors whose
    /// inputs are untouched are not re-run on update.
    pub fn touches(&self, detector: DetectorKind) -> bool {
        match detector {
            DetectorKind::Room => self.room.is_some() || self.touches_window(),
            DetectorKind::Duplicate => self.subject.is_some() || self.block.is_some() || self.batch.is_some() || self.class_type.is_some(),
            DetectorKind::Instructor => self.instructor.is_some() || self.subject.is_some() || self.touches_window(),
        }
    }

    /// Merges the patch over the stored session, producing the session's new intended state.
    pub fn apply(&self, session: &ScheduleSession, acting_user: UserId) -> Result<CandidateSession, ValidationError> {
        let stored_weekday = session.window.and_then(|window| window.weekday);
        let stored_start = session.window.map(|window| window.start);
        let stored_end = session.window.map(|window| window.end);

        let window = TimeWindow::from_parts(
            self.weekday.unwrap_or(stored_weekday),
            self.start.unwrap_or(stored_start),
            self.end.unwrap_or(stored_end),
        )?;

        Ok(CandidateSession {
            term: session.term,
            subject: self.subject.unwrap_or(session.subject),
            room: self.room.unwrap_or(session.room),
            instructor: self.instructor.unwrap_or(session.instructor),
            window,
            section: Section { block: self.block.unwrap_or(session.section.block), batch: self.batch.unwrap_or(session.section.batch) },
            class_type: self.class_type.clone().unwrap_or_else(|| session.class_type.clone()),
            last_updated_by: acting_user,
        })
    }
}
