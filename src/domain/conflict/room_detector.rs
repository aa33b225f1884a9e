use crate::domain::conflict::detector_trait::{ConflictDetector, DetectionContext, DetectorKind};
use crate::domain::conflict::finding::ConflictFinding;
use crate::domain::session::schedule_session::CandidateSession;
use crate::error::PersistenceError;

/// Rejects a session whose room is already in use at an overlapping time on the same day.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoomDetector;

impl ConflictDetector for RoomDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Room
    }

    fn detect(&self, candidate: &CandidateSession, context: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>, PersistenceError> {
        // Room is optional, and an unscheduled session occupies no room time.
        let (Some(room), Some(window)) = (candidate.room, candidate.window.as_ref()) else {
            return Ok(Vec::new());
        };

        let conflicts = context.sessions.find_room_conflicts(&candidate.term, room, window, context.exclude)?;

        let finding = conflicts.first().and_then(|first| {
            first.window.map(|conflicting_window| ConflictFinding::RoomConflict {
                room,
                conflicting_window,
                existing_session: first.id,
                total: conflicts.len(),
            })
        });

        if let Some(ConflictFinding::RoomConflict { existing_session, total, .. }) = &finding {
            log::debug!("RoomDetector: room {} clashes with session {} ({} overlapping in total).", room, existing_session, total);
        }

        Ok(finding.into_iter().collect())
    }
}
