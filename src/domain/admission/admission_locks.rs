use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::session::schedule_session::{CandidateSession, SectionKey, Term};
use crate::domain::utils::id::{InstructorId, RoomId, SessionId};
use crate::error::PersistenceError;

/// Resource an admission has to hold exclusively between its conflict checks and its write.
///
/// `Session` sorts before every other key. An update holds it from reading the stored
/// record until its write, and takes the candidate's keys only after that.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    Session(SessionId),
    Room(Term, RoomId),
    Instructor(Term, InstructorId),
    Section(SectionKey),
}

impl LockKey {
    /// Keys touched by a candidate, in the global acquisition order.
    pub fn for_candidate(candidate: &CandidateSession) -> BTreeSet<LockKey> {
        let mut keys = BTreeSet::new();

        if let Some(room) = candidate.room {
            keys.insert(LockKey::Room(candidate.term, room));
        }
        if let Some(instructor) = candidate.instructor {
            keys.insert(LockKey::Instructor(candidate.term, instructor));
        }
        keys.insert(LockKey::Section(candidate.section_key()));

        keys
    }
}

/// One mutex per lock key, created on first use.
///
/// Two admissions touching the same room, instructor or section run their
/// check-then-commit sequence one after the other; unrelated admissions run in parallel.
/// Keys are always taken in `LockKey` order so two admissions cannot deadlock.
#[derive(Debug, Clone, Default)]
pub struct AdmissionLocks {
    gates: Arc<Mutex<HashMap<LockKey, Arc<Mutex<()>>>>>,
}

impl AdmissionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The gates guarding a candidate, sorted by key.
    pub fn gates_for(&self, candidate: &CandidateSession) -> Result<Vec<Arc<Mutex<()>>>, PersistenceError> {
        let mut gates = self.gates.lock().map_err(|_| PersistenceError::LockPoisoned)?;

        Ok(LockKey::for_candidate(candidate).into_iter().map(|key| gates.entry(key).or_default().clone()).collect())
    }

    /// The gate for a single key.
    pub fn gate(&self, key: LockKey) -> Result<Arc<Mutex<()>>, PersistenceError> {
        let mut gates = self.gates.lock().map_err(|_| PersistenceError::LockPoisoned)?;

        Ok(gates.entry(key).or_default().clone())
    }

    /// Locks all gates in the given order. Guards are released when the returned vector is dropped.
    pub fn lock_all(gates: &[Arc<Mutex<()>>]) -> Result<Vec<MutexGuard<'_, ()>>, PersistenceError> {
        gates.iter().map(|gate| gate.lock().map_err(|_| PersistenceError::LockPoisoned)).collect()
    }

    pub fn gate_count(&self) -> usize {
        self.gates.lock().map(|gates| gates.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::schedule_session::{ClassType, Section};
    use crate::domain::utils::id::{CurriculumSubjectId, UserId};

    fn candidate(room: Option<i64>, instructor: Option<i64>) -> CandidateSession {
        CandidateSession {
            term: Term::new(2020, 1),
            subject: CurriculumSubjectId::new(5),
            room: room.map(RoomId::new),
            instructor: instructor.map(InstructorId::new),
            window: None,
            section: Section { block: 1, batch: 1 },
            class_type: ClassType::Lecture,
            last_updated_by: UserId::new(1),
        }
    }

    #[test]
    fn keys_cover_room_instructor_and_section() {
        assert_eq!(LockKey::for_candidate(&candidate(Some(3), Some(7))).len(), 3);
        assert_eq!(LockKey::for_candidate(&candidate(None, None)).len(), 1);
    }

    #[test]
    fn same_key_shares_one_gate() {
        let locks = AdmissionLocks::new();
        let first = locks.gates_for(&candidate(Some(3), None)).unwrap();
        let second = locks.gates_for(&candidate(Some(3), Some(7))).unwrap();

        assert_eq!(locks.gate_count(), 3);
        assert!(first.iter().any(|gate| second.iter().any(|other| Arc::ptr_eq(gate, other))));
    }

    #[test]
    fn session_key_sorts_before_candidate_keys() {
        let session = LockKey::Session(SessionId::new(99));

        assert!(LockKey::for_candidate(&candidate(Some(3), Some(7))).iter().all(|key| session < *key));
    }

    #[test]
    fn session_gate_is_shared_per_session() {
        let locks = AdmissionLocks::new();
        let first = locks.gate(LockKey::Session(SessionId::new(1))).unwrap();
        let again = locks.gate(LockKey::Session(SessionId::new(1))).unwrap();
        let other = locks.gate(LockKey::Session(SessionId::new(2))).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(locks.gate_count(), 2);
    }

    #[test]
    fn gates_can_be_locked_again_after_release() {
        let locks = AdmissionLocks::new();
        let gates = locks.gates_for(&candidate(Some(3), Some(7))).unwrap();

        {
            let guards = AdmissionLocks::lock_all(&gates).unwrap();
            assert_eq!(guards.len(), 3);
            assert!(gates[0].try_lock().is_err());
        }

        assert!(gates[0].try_lock().is_ok());
    }
}
