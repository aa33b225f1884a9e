use crate::domain::conflict::detector_trait::{ConflictDetector, DetectionContext, DetectorKind};
use crate::domain::conflict::finding::{ConflictFinding, InstructorConflictKind};
use crate::domain::session::schedule_session::CandidateSession;
use crate::domain::utils::id::InstructorId;
use crate::error::PersistenceError;

/// Checks the assigned instructor: subject preference, declared availability and
/// overlapping sessions. Unlike the other detectors it can report several findings.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstructorDetector;

impl InstructorDetector {
    fn preference(&self, instructor: InstructorId, candidate: &CandidateSession, context: &DetectionContext<'_>) -> Result<Option<InstructorConflictKind>, PersistenceError> {
        if context.profiles.is_subject_preferred(instructor, &candidate.term, candidate.subject)? {
            return Ok(None);
        }

        Ok(Some(InstructorConflictKind::NotPreferred { subject: candidate.subject }))
    }

    fn availability(&self, instructor: InstructorId, candidate: &CandidateSession, context: &DetectionContext<'_>) -> Result<Option<InstructorConflictKind>, PersistenceError> {
        let Some(window) = candidate.window.as_ref() else {
            return Ok(None);
        };

        let available = match window.weekday {
            Some(day) => context.profiles.get_availability(instructor, &candidate.term, day)?,
            None => None,
        };

        match available {
            Some(available) if !available.contains(window) => Ok(Some(InstructorConflictKind::OutsideAvailability { available })),
            Some(_) => Ok(None),
            None if context.require_explicit_availability => Ok(Some(InstructorConflictKind::MissingAvailability { weekday: window.weekday })),
            None => {
                log::debug!("InstructorDetector: instructor {} declared no availability for {:?}, not constraining.", instructor, window.weekday);
                Ok(None)
            }
        }
    }

    fn double_booking(&self, instructor: InstructorId, candidate: &CandidateSession, context: &DetectionContext<'_>) -> Result<Option<InstructorConflictKind>, PersistenceError> {
        let Some(window) = candidate.window.as_ref() else {
            return Ok(None);
        };

        // An identical window and a partial overlap are the same conflict.
        let sessions = context.sessions.find_instructor_sessions(&candidate.term, instructor, window, context.exclude)?;

        Ok(sessions.first().and_then(|first| {
            first.window.map(|conflicting_window| InstructorConflictKind::DoubleBooked {
                existing_session: first.id,
                conflicting_window,
                total: sessions.len(),
            })
        }))
    }
}

impl ConflictDetector for InstructorDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Instructor
    }

    fn detect(&self, candidate: &CandidateSession, context: &DetectionContext<'_>) -> Result<Vec<ConflictFinding>, PersistenceError> {
        let Some(instructor) = candidate.instructor else {
            return Ok(Vec::new());
        };

        let kinds: Vec<InstructorConflictKind> = [
            self.preference(instructor, candidate, context)?,
            self.availability(instructor, candidate, context)?,
            self.double_booking(instructor, candidate, context)?,
        ]
        .into_iter()
        .flatten()
        .collect();

        if kinds.is_empty() {
            return Ok(Vec::new());
        }

        let instructor_name = context.profiles.get_instructor(instructor)?.map(|profile| profile.display_name());

        Ok(kinds
            .into_iter()
            .map(|kind| ConflictFinding::InstructorConflict { instructor, instructor_name: instructor_name.clone(), kind })
            .collect())
    }
}
