use std::sync::Arc;
use std::time::Instant;

use crate::api::session_dto::{SessionPatchDto, SessionRequestDto};
use crate::domain::admission::admission_config::AdmissionConfig;
use crate::domain::admission::admission_locks::{AdmissionLocks, LockKey};
use crate::domain::admission::admission_state::{AdmissionOperation, AdmissionState};
use crate::domain::conflict::detector_trait::{ConflictDetector, DetectionContext, DetectorKind};
use crate::domain::conflict::duplicate_detector::DuplicateDetector;
use crate::domain::conflict::finding::{ConflictFinding, InstructorConflictKind, count_by_category};
use crate::domain::conflict::instructor_detector::InstructorDetector;
use crate::domain::conflict::room_detector::RoomDetector;
use crate::domain::instructor::profile_lookup::InstructorProfileLookup;
use crate::domain::session::schedule_session::{CandidateSession, ScheduleSession, Term};
use crate::domain::session::session_patch::SessionPatch;
use crate::domain::session::session_repository::{SessionRepository, StorageConstraint};
use crate::domain::utils::id::{InstructorId, RoomId, SessionId, UserId};
use crate::domain::utils::statistics::{StatParameter, StatisticEvent, StatsCollector};
use crate::error::{AdmissionError, PersistenceError, ValidationError};

/// Gate in front of the session repository.
///
/// A request is normalized, checked by every detector against the current
/// timetable and either rejected with the complete list of findings or committed.
/// The checks and the write of one request happen while holding the locks of the
/// room, instructor and section it touches, so two concurrent requests cannot both
/// pass their checks and then double-book.
#[derive(Debug)]
pub struct AdmissionController {
    sessions: Arc<dyn SessionRepository>,
    profiles: Arc<dyn InstructorProfileLookup>,
    detectors: Vec<Box<dyn ConflictDetector>>,
    locks: AdmissionLocks,
    config: AdmissionConfig,
    statistics: Option<StatsCollector>,
}

impl AdmissionController {
    pub fn new(sessions: Arc<dyn SessionRepository>, profiles: Arc<dyn InstructorProfileLookup>, config: AdmissionConfig) -> Self {
        AdmissionController {
            sessions,
            profiles,
            detectors: vec![Box::new(RoomDetector), Box::new(DuplicateDetector), Box::new(InstructorDetector)],
            locks: AdmissionLocks::new(),
            config,
            statistics: None,
        }
    }

    /// Like [`AdmissionController::new`], but opens the statistics file named in the config.
    pub fn open(sessions: Arc<dyn SessionRepository>, profiles: Arc<dyn InstructorProfileLookup>, config: AdmissionConfig) -> crate::error::Result<Self> {
        let statistics = match &config.statistics_file {
            Some(path) => Some(StatsCollector::to_file(path)?),
            None => None,
        };

        let mut controller = AdmissionController::new(sessions, profiles, config);
        controller.statistics = statistics;
        Ok(controller)
    }

    pub fn with_statistics(mut self, collector: StatsCollector) -> Self {
        self.statistics = Some(collector);
        self
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Normalizes a raw request exactly once and submits it.
    pub fn submit_request(&self, request: &SessionRequestDto, acting_user: UserId) -> Result<ScheduleSession, AdmissionError> {
        let started = Instant::now();

        match request.normalize(acting_user) {
            Ok(candidate) => self.submit(candidate),
            Err(e) => {
                log::info!("Schedule request from user {} is invalid: {}", acting_user, e);
                let result = Err(AdmissionError::Validation(e));
                self.record(AdmissionOperation::Submit, None, &result, started);
                result
            }
        }
    }

    /// Runs all detectors on the candidate and commits it when none reports a finding.
    pub fn submit(&self, candidate: CandidateSession) -> Result<ScheduleSession, AdmissionError> {
        let started = Instant::now();
        let term = candidate.term;

        let result = self.admit(candidate, None, |_| true, |checked| self.sessions.commit(checked));

        self.record(AdmissionOperation::Submit, Some(term), &result, started);
        result
    }

    pub fn update_request(&self, id: SessionId, patch: &SessionPatchDto, acting_user: UserId) -> Result<ScheduleSession, AdmissionError> {
        let started = Instant::now();

        match patch.normalize() {
            Ok(patch) => self.update(id, &patch, acting_user),
            Err(e) => {
                let result = Err(AdmissionError::Validation(e));
                self.record(AdmissionOperation::Update, None, &result, started);
                result
            }
        }
    }

    /// Applies a patch to a committed session.
    ///
    /// Only the detectors whose inputs the patch changes run again, and the session's
    /// own stored record never counts as a conflict.
    pub fn update(&self, id: SessionId, patch: &SessionPatch, acting_user: UserId) -> Result<ScheduleSession, AdmissionError> {
        let started = Instant::now();

        let result = self.update_checked(id, patch, acting_user);

        let term = result.as_ref().ok().map(|session| session.term);
        self.record(AdmissionOperation::Update, term, &result, started);
        result
    }

    fn update_checked(&self, id: SessionId, patch: &SessionPatch, acting_user: UserId) -> Result<ScheduleSession, AdmissionError> {
        if patch.is_empty() {
            return Err(ValidationError::EmptyPatch.into());
        }

        let session_gate = self.locks.gate(LockKey::Session(id))?;
        let _session_guard = AdmissionLocks::lock_all(std::slice::from_ref(&session_gate))?;

        let stored = self.sessions.get(id)?.ok_or(AdmissionError::UnknownSession(id))?;
        let candidate = patch.apply(&stored, acting_user)?;

        self.admit(candidate, Some(id), |kind| patch.touches(kind), |checked| self.sessions.update(id, checked))
            .map_err(|e| match e {
                AdmissionError::Persistence(PersistenceError::UnknownSession(missing)) => AdmissionError::UnknownSession(missing),
                other => other,
            })
    }

    pub fn delete(&self, id: SessionId, acting_user: UserId) -> Result<ScheduleSession, AdmissionError> {
        let started = Instant::now();

        let result = self
            .locks
            .gate(LockKey::Session(id))
            .and_then(|gate| {
                let _session_guard = AdmissionLocks::lock_all(std::slice::from_ref(&gate))?;
                self.sessions.delete(id)
            })
            .map_err(|e| match e {
                PersistenceError::UnknownSession(missing) => AdmissionError::UnknownSession(missing),
                other => AdmissionError::Persistence(other),
            });

        if let Ok(session) = &result {
            tracing::info!(session = %session.id, term = %session.term, user = %acting_user, "Schedule session deleted");
        }

        let term = result.as_ref().ok().map(|session| session.term);
        self.record(AdmissionOperation::Delete, term, &result, started);
        result
    }

    pub fn get(&self, id: SessionId) -> Result<Option<ScheduleSession>, AdmissionError> {
        Ok(self.sessions.get(id)?)
    }

    pub fn list(&self, term: &Term) -> Result<Vec<ScheduleSession>, AdmissionError> {
        Ok(self.sessions.list(term)?)
    }

    pub fn list_for_room(&self, term: &Term, room: RoomId) -> Result<Vec<ScheduleSession>, AdmissionError> {
        Ok(self.sessions.list_for_room(term, room)?)
    }

    pub fn list_for_instructor(&self, term: &Term, instructor: InstructorId) -> Result<Vec<ScheduleSession>, AdmissionError> {
        Ok(self.sessions.list_for_instructor(term, instructor)?)
    }

    pub fn session_count(&self) -> Result<usize, AdmissionError> {
        Ok(self.sessions.len()?)
    }

    /// Received -> Checking -> Rejected | Committed, all under the candidate's locks.
    fn admit<S, P>(&self, candidate: CandidateSession, exclude: Option<SessionId>, scope: S, persist: P) -> Result<ScheduleSession, AdmissionError>
    where
        S: Fn(DetectorKind) -> bool,
        P: FnOnce(CandidateSession) -> Result<ScheduleSession, PersistenceError>,
    {
        tracing::debug!(state = ?AdmissionState::Received, term = %candidate.term, subject = %candidate.subject, "Schedule request received");

        let gates = self.locks.gates_for(&candidate)?;
        let _guards = AdmissionLocks::lock_all(&gates)?;

        tracing::debug!(state = ?AdmissionState::Checking, term = %candidate.term, "Checking schedule request");
        let findings = self.run_detectors(&candidate, exclude, scope)?;

        if !findings.is_empty() {
            return Err(self.reject(&candidate, findings));
        }

        match persist(candidate.clone()) {
            Ok(session) => {
                tracing::info!(
                    state = ?AdmissionState::Committed,
                    session = %session.id,
                    term = %session.term,
                    window = ?session.window,
                    "Schedule session committed"
                );
                Ok(session)
            }
            Err(PersistenceError::ConstraintViolation { constraint, existing }) => match self.finding_from_violation(&candidate, constraint, *existing)? {
                Ok(finding) => Err(self.reject(&candidate, vec![finding])),
                Err(violation) => Err(AdmissionError::Persistence(violation)),
            },
            Err(e) => {
                log::error!("Committing a checked schedule session failed: {}", e);
                Err(AdmissionError::Persistence(e))
            }
        }
    }

    fn run_detectors<S>(&self, candidate: &CandidateSession, exclude: Option<SessionId>, scope: S) -> Result<Vec<ConflictFinding>, PersistenceError>
    where
        S: Fn(DetectorKind) -> bool,
    {
        let context = DetectionContext {
            sessions: self.sessions.as_ref(),
            profiles: self.profiles.as_ref(),
            exclude,
            require_explicit_availability: self.config.require_explicit_availability,
        };

        let mut findings = Vec::new();
        for detector in self.detectors.iter().filter(|detector| scope(detector.kind())) {
            findings.extend(detector.detect(candidate, &context)?);
        }

        Ok(findings)
    }

    fn reject(&self, candidate: &CandidateSession, findings: Vec<ConflictFinding>) -> AdmissionError {
        let (room, duplicate, instructor) = count_by_category(&findings);
        tracing::info!(
            state = ?AdmissionState::Rejected,
            term = %candidate.term,
            subject = %candidate.subject,
            room_conflicts = room,
            duplicate_conflicts = duplicate,
            instructor_conflicts = instructor,
            "Schedule request rejected"
        );

        AdmissionError::Conflict(findings)
    }

    /// Turns a constraint the store enforced on its own into the finding a detector
    /// would have reported. This only happens when the store changed between check and write.
    ///
    /// # Returns
    /// `Ok(Err(violation))` when the violation cannot be expressed as a finding.
    fn finding_from_violation(
        &self,
        candidate: &CandidateSession,
        constraint: StorageConstraint,
        existing: ScheduleSession,
    ) -> Result<Result<ConflictFinding, PersistenceError>, PersistenceError> {
        log::warn!("Storage constraint '{}' caught a conflict with session {} that the detectors did not see.", constraint, existing.id);

        let finding = match (constraint, candidate.room, candidate.instructor, existing.window) {
            (StorageConstraint::Room, Some(room), _, Some(conflicting_window)) => {
                Some(ConflictFinding::RoomConflict { room, conflicting_window, existing_session: existing.id, total: 1 })
            }
            (StorageConstraint::Instructor, _, Some(instructor), Some(conflicting_window)) => Some(ConflictFinding::InstructorConflict {
                instructor,
                instructor_name: self.profiles.get_instructor(instructor)?.map(|profile| profile.display_name()),
                kind: InstructorConflictKind::DoubleBooked { existing_session: existing.id, conflicting_window, total: 1 },
            }),
            (StorageConstraint::Section, ..) => Some(ConflictFinding::DuplicateConflict { existing_session: Box::new(existing.clone()) }),
            _ => None,
        };

        Ok(finding.ok_or(PersistenceError::ConstraintViolation { constraint, existing: Box::new(existing) }))
    }

    fn record(&self, operation: AdmissionOperation, term: Option<Term>, result: &Result<ScheduleSession, AdmissionError>, started: Instant) {
        let Some(statistics) = &self.statistics else {
            return;
        };

        let mut event = StatisticEvent::new();
        event.set(StatParameter::Operation, operation.to_string());
        event.set(StatParameter::ProcessingTimeUs, i64::try_from(started.elapsed().as_micros()).unwrap_or(i64::MAX));

        if let Some(term) = term {
            event.set(StatParameter::AcademicYear, term.academic_year_id.value());
            event.set(StatParameter::Semester, term.semester_id.value());
        }

        match result {
            Ok(session) => {
                let outcome = if operation == AdmissionOperation::Delete { "Deleted" } else { "Committed" };
                event.set(StatParameter::Outcome, outcome).set(StatParameter::SessionId, session.id.value());
            }
            Err(AdmissionError::Conflict(findings)) => {
                let (room, duplicate, instructor) = count_by_category(findings);
                event
                    .set(StatParameter::Outcome, "Rejected")
                    .set(StatParameter::RoomConflicts, room)
                    .set(StatParameter::DuplicateConflicts, duplicate)
                    .set(StatParameter::InstructorConflicts, instructor);
            }
            Err(AdmissionError::Validation(_)) => {
                event.set(StatParameter::Outcome, "Invalid");
            }
            Err(AdmissionError::Persistence(_)) | Err(AdmissionError::UnknownSession(_)) => {
                event.set(StatParameter::Outcome, "Failed");
            }
        }

        statistics.add_event(event);
    }
}
