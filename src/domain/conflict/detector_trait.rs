use std::fmt;

use crate::domain::conflict::finding::ConflictFinding;
use crate::domain::instructor::profile_lookup::InstructorProfileLookup;
use crate::domain::session::schedule_session::CandidateSession;
use crate::domain::session::session_repository::SessionRepository;
use crate::domain::utils::id::SessionId;
use crate::error::PersistenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    Room,
    Duplicate,
    Instructor,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorKind::Room => write!(f, "room"),
            DetectorKind::Duplicate => write!(f, "duplicate"),
            DetectorKind::Instructor => write!(f, "instructor"),
        }
    }
}

/// Everything a detector may read. Detectors never write.
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub sessions: &'a dyn SessionRepository,
    pub profiles: &'a dyn InstructorProfileLookup,
    /// Session whose stored record is ignored, set when checking an update.
    pub exclude: Option<SessionId>,
    pub require_explicit_availability: bool,
}

pub trait ConflictDetector: fmt::Debug + Send + Sync {
    fn kind(&self) -> DetectorKind;

    /// Checks the candidate against the current repository state.
    ///
    /// # Returns
    /// The findings of this detector, empty if the candidate passes. Only storage
    /// failures are errors.
    fn detect(&self, candidate: &CandidateSession, context: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>, PersistenceError>;
}
