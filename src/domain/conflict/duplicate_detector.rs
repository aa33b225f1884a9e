use crate::domain::conflict::detector_trait::{ConflictDetector, DetectionContext, DetectorKind};
use crate::domain::conflict::finding::ConflictFinding;
use crate::domain::session::schedule_session::CandidateSession;
use crate::error::PersistenceError;

/// A section gets one session per subject and class type per term, whatever the time, room or instructor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuplicateDetector;

impl ConflictDetector for DuplicateDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Duplicate
    }

    fn detect(&self, candidate: &CandidateSession, context: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>, PersistenceError> {
        let duplicate = context.sessions.find_duplicate(&candidate.section_key(), context.exclude)?;

        Ok(duplicate.map(|existing| ConflictFinding::DuplicateConflict { existing_session: Box::new(existing) }).into_iter().collect())
    }
}
