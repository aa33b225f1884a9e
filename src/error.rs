use chrono::NaiveTime;
use thiserror::Error;

use crate::domain::conflict::finding::ConflictFinding;
use crate::domain::session::schedule_session::ScheduleSession;
use crate::domain::session::session_repository::StorageConstraint;
use crate::domain::utils::id::SessionId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write CSV output: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to build timetable model: {0}")]
    ModelConstructionError(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Admission(#[from] AdmissionError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The request itself is malformed. Raised before any conflict check runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field '{0}'.")]
    MissingField(&'static str),

    #[error("Field '{field}' does not hold a readable time: '{value}'.")]
    InvalidTime { field: &'static str, value: String },

    #[error("'{0}' is not a day of the week.")]
    InvalidWeekday(String),

    #[error("'{0}' is not a class type.")]
    InvalidClassType(String),

    #[error("A scheduled class needs both a start and an end time, and a day needs a time.")]
    IncompleteWindow,

    #[error("Start time {start} must be before end time {end}.")]
    EmptyWindow { start: NaiveTime, end: NaiveTime },

    #[error("The update does not change any field.")]
    EmptyPatch,
}

/// Failure of the session store or of the lookups backing the detectors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Storage constraint '{constraint}' rejected the session, it collides with session {}.", .existing.id)]
    ConstraintViolation { constraint: StorageConstraint, existing: Box<ScheduleSession> },

    #[error("Session {0} does not exist.")]
    UnknownSession(SessionId),

    #[error("Session id {0} is already taken.")]
    DuplicateId(SessionId),

    #[error("A lock guarding the schedule data was poisoned.")]
    LockPoisoned,
}

/// Outcome of an admission request that did not end in a committed session.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Invalid schedule request: {0}")]
    Validation(#[from] ValidationError),

    /// Normal negative outcome: the caller can adjust the request and retry.
    #[error("Schedule request rejected with {} conflict(s).", .0.len())]
    Conflict(Vec<ConflictFinding>),

    #[error("Failed to persist schedule session: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Schedule session {0} does not exist.")]
    UnknownSession(SessionId),
}

impl AdmissionError {
    pub fn findings(&self) -> Option<&[ConflictFinding]> {
        match self {
            AdmissionError::Conflict(findings) => Some(findings),
            _ => None,
        }
    }
}
