use std::fmt;

use crate::domain::session::schedule_session::{CandidateSession, ScheduleSession, SectionKey, Term};
use crate::domain::time_window::TimeWindow;
use crate::domain::utils::id::{InstructorId, RoomId, SessionId};
use crate::error::PersistenceError;

/// Uniqueness rules the store enforces on its own, as a backstop behind the detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageConstraint {
    /// No two sessions overlap in the same room on the same day.
    Room,
    /// No two sessions overlap for the same instructor on the same day.
    Instructor,
    /// One session per term, subject, block, batch and class type.
    Section,
}

impl fmt::Display for StorageConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageConstraint::Room => write!(f, "room_time"),
            StorageConstraint::Instructor => write!(f, "instructor_time"),
            StorageConstraint::Section => write!(f, "section_subject"),
        }
    }
}

/// Authoritative collection of committed sessions.
///
/// Every query reads current state; nothing is cached between calls. Queries that
/// return several sessions order them by ascending id, so "the first conflict" is stable.
/// `exclude` lets an update ignore the session's own stored record.
pub trait SessionRepository: fmt::Debug + Send + Sync {
    /// Sessions of the term in `room` on the window's day whose times strictly overlap `window`.
    fn find_room_conflicts(
        &self,
        term: &Term,
        room: RoomId,
        window: &TimeWindow,
        exclude: Option<SessionId>,
    ) -> Result<Vec<ScheduleSession>, PersistenceError>;

    /// Exact match on (term, subject, block, batch, class type). Time plays no part.
    fn find_duplicate(&self, key: &SectionKey, exclude: Option<SessionId>) -> Result<Option<ScheduleSession>, PersistenceError>;

    /// Same overlap semantics as [`SessionRepository::find_room_conflicts`], keyed on the instructor.
    fn find_instructor_sessions(
        &self,
        term: &Term,
        instructor: InstructorId,
        window: &TimeWindow,
        exclude: Option<SessionId>,
    ) -> Result<Vec<ScheduleSession>, PersistenceError>;

    /// Inserts a new session and assigns its id.
    fn commit(&self, candidate: CandidateSession) -> Result<ScheduleSession, PersistenceError>;

    /// Replaces the stored state of `id`. Conflict detection is the caller's job,
    /// the store only applies its constraints.
    fn update(&self, id: SessionId, candidate: CandidateSession) -> Result<ScheduleSession, PersistenceError>;

    fn delete(&self, id: SessionId) -> Result<ScheduleSession, PersistenceError>;

    fn get(&self, id: SessionId) -> Result<Option<ScheduleSession>, PersistenceError>;

    /// All sessions of a term, newest first.
    fn list(&self, term: &Term) -> Result<Vec<ScheduleSession>, PersistenceError>;

    fn list_for_room(&self, term: &Term, room: RoomId) -> Result<Vec<ScheduleSession>, PersistenceError>;

    fn list_for_instructor(&self, term: &Term, instructor: InstructorId) -> Result<Vec<ScheduleSession>, PersistenceError>;

    fn len(&self) -> Result<usize, PersistenceError>;

    fn is_empty(&self) -> Result<bool, PersistenceError> {
        self.len().map(|len| len == 0)
    }
}
