use chrono::Weekday;
use slotmap::{SlotMap, new_key_type};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::session::schedule_session::{CandidateSession, ScheduleSession, SectionKey, Term};
use crate::domain::session::session_repository::{SessionRepository, StorageConstraint};
use crate::domain::time_window::TimeWindow;
use crate::domain::utils::id::{InstructorId, RoomId, SessionId};
use crate::error::PersistenceError;

new_key_type! {
    pub struct SessionKey;
}

type RoomDayKey = (Term, RoomId, Weekday);
type InstructorDayKey = (Term, InstructorId, Weekday);

#[derive(Debug)]
struct StoreInner {
    /// Session storage.
    slots: SlotMap<SessionKey, ScheduleSession>,

    /// Index lookup internal key (SessionKey) using the public session id (SessionId).
    id_index: HashMap<SessionId, SessionKey>,

    /// Sessions per term, room and day. Sessions without a weekday are never indexed here.
    room_index: HashMap<RoomDayKey, BTreeSet<SessionId>>,

    /// Sessions per term, instructor and day.
    instructor_index: HashMap<InstructorDayKey, BTreeSet<SessionId>>,

    /// Sessions per term, subject, block, batch and class type. More than one only for restored legacy data.
    section_index: HashMap<SectionKey, BTreeSet<SessionId>>,

    next_id: i64,
}

impl StoreInner {
    fn session(&self, id: &SessionId) -> Option<&ScheduleSession> {
        self.id_index.get(id).and_then(|key| self.slots.get(*key))
    }

    fn overlapping(&self, ids: Option<&BTreeSet<SessionId>>, window: &TimeWindow, exclude: Option<SessionId>) -> Vec<ScheduleSession> {
        ids.into_iter()
            .flatten()
            .filter(|id| Some(**id) != exclude)
            .filter_map(|id| self.session(id))
            .filter(|session| session.window.is_some_and(|stored| stored.overlaps(window)))
            .cloned()
            .collect()
    }

    fn room_overlaps(&self, term: &Term, room: RoomId, window: &TimeWindow, exclude: Option<SessionId>) -> Vec<ScheduleSession> {
        match window.weekday {
            Some(day) => self.overlapping(self.room_index.get(&(*term, room, day)), window, exclude),
            None => Vec::new(),
        }
    }

    fn instructor_overlaps(&self, term: &Term, instructor: InstructorId, window: &TimeWindow, exclude: Option<SessionId>) -> Vec<ScheduleSession> {
        match window.weekday {
            Some(day) => self.overlapping(self.instructor_index.get(&(*term, instructor, day)), window, exclude),
            None => Vec::new(),
        }
    }

    /// Lowest-id session booked on the section, other than `exclude`.
    fn section_holder(&self, key: &SectionKey, exclude: Option<SessionId>) -> Option<&ScheduleSession> {
        self.section_index.get(key)?.iter().filter(|id| Some(**id) != exclude).find_map(|id| self.session(id))
    }

    /// Storage-level uniqueness checks, applied to every insert and replace.
    ///
    /// When `previous` is given (a replace), a constraint is only re-checked if the
    /// fields it covers changed, so untouched stored data is never re-judged.
    fn check_constraints(
        &self,
        candidate: &CandidateSession,
        exclude: Option<SessionId>,
        previous: Option<&ScheduleSession>,
    ) -> Result<(), PersistenceError> {
        let violation = |constraint: StorageConstraint, existing: &ScheduleSession| PersistenceError::ConstraintViolation {
            constraint,
            existing: Box::new(existing.clone()),
        };

        let room_changed = previous.is_none_or(|stored| stored.room != candidate.room || stored.window != candidate.window);
        if let (true, Some(room), Some(window)) = (room_changed, candidate.room, candidate.window.as_ref()) {
            if let Some(existing) = self.room_overlaps(&candidate.term, room, window, exclude).first() {
                return Err(violation(StorageConstraint::Room, existing));
            }
        }

        let instructor_changed = previous.is_none_or(|stored| stored.instructor != candidate.instructor || stored.window != candidate.window);
        if let (true, Some(instructor), Some(window)) = (instructor_changed, candidate.instructor, candidate.window.as_ref()) {
            if let Some(existing) = self.instructor_overlaps(&candidate.term, instructor, window, exclude).first() {
                return Err(violation(StorageConstraint::Instructor, existing));
            }
        }

        let section_changed = previous.is_none_or(|stored| stored.section_key() != candidate.section_key());
        if section_changed {
            if let Some(existing) = self.section_holder(&candidate.section_key(), exclude) {
                return Err(violation(StorageConstraint::Section, existing));
            }
        }

        Ok(())
    }

    fn index(&mut self, session: &ScheduleSession) {
        if let Some(day) = session.window.and_then(|window| window.weekday) {
            if let Some(room) = session.room {
                self.room_index.entry((session.term, room, day)).or_default().insert(session.id);
            }
            if let Some(instructor) = session.instructor {
                self.instructor_index.entry((session.term, instructor, day)).or_default().insert(session.id);
            }
        }

        self.section_index.entry(session.section_key()).or_default().insert(session.id);
    }

    fn unindex(&mut self, session: &ScheduleSession) {
        if let Some(day) = session.window.and_then(|window| window.weekday) {
            if let Some(room) = session.room {
                if let Some(ids) = self.room_index.get_mut(&(session.term, room, day)) {
                    ids.remove(&session.id);
                }
            }
            if let Some(instructor) = session.instructor {
                if let Some(ids) = self.instructor_index.get_mut(&(session.term, instructor, day)) {
                    ids.remove(&session.id);
                }
            }
        }

        if let Some(ids) = self.section_index.get_mut(&session.section_key()) {
            ids.remove(&session.id);
        }
    }

    fn insert(&mut self, session: ScheduleSession) {
        self.index(&session);
        let id = session.id;
        let key = self.slots.insert(session);
        self.id_index.insert(id, key);
    }

    fn sorted_newest_first(mut sessions: Vec<ScheduleSession>) -> Vec<ScheduleSession> {
        sessions.sort_by(|a, b| b.id.cmp(&a.id));
        sessions
    }
}

/// In-memory session repository.
///
/// Clones share the same underlying data. All maps are protected with a single lock,
/// so constraint checks and the write they guard are one atomic step.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                slots: SlotMap::with_key(),
                id_index: HashMap::new(),
                room_index: HashMap::new(),
                instructor_index: HashMap::new(),
                section_index: HashMap::new(),
                next_id: 1,
            })),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreInner>, PersistenceError> {
        self.inner.read().map_err(|_| PersistenceError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreInner>, PersistenceError> {
        self.inner.write().map_err(|_| PersistenceError::LockPoisoned)
    }

    /// Loads an already committed session, keeping its id. Conflict constraints are
    /// not applied: stored data is taken as it is.
    pub fn restore(&self, session: ScheduleSession) -> Result<(), PersistenceError> {
        let mut guard = self.write()?;

        if guard.id_index.contains_key(&session.id) {
            return Err(PersistenceError::DuplicateId(session.id));
        }

        if guard.check_constraints(&session.to_candidate(), Some(session.id), None).is_err() {
            log::warn!("Restored session {} collides with an existing session. Keeping it as stored.", session.id);
        }

        guard.next_id = guard.next_id.max(session.id.value() + 1);
        guard.insert(session);
        Ok(())
    }

    /// Every stored session of every term, oldest first.
    pub fn snapshot(&self) -> Result<Vec<ScheduleSession>, PersistenceError> {
        let mut sessions: Vec<ScheduleSession> = self.read()?.slots.values().cloned().collect();
        sessions.sort_by_key(|session| session.id);
        Ok(sessions)
    }
}

impl SessionRepository for SessionStore {
    fn find_room_conflicts(
        &self,
        term: &Term,
        room: RoomId,
        window: &TimeWindow,
        exclude: Option<SessionId>,
    ) -> Result<Vec<ScheduleSession>, PersistenceError> {
        Ok(self.read()?.room_overlaps(term, room, window, exclude))
    }

    fn find_duplicate(&self, key: &SectionKey, exclude: Option<SessionId>) -> Result<Option<ScheduleSession>, PersistenceError> {
        let guard = self.read()?;

        Ok(guard.section_holder(key, exclude).cloned())
    }

    fn find_instructor_sessions(
        &self,
        term: &Term,
        instructor: InstructorId,
        window: &TimeWindow,
        exclude: Option<SessionId>,
    ) -> Result<Vec<ScheduleSession>, PersistenceError> {
        Ok(self.read()?.instructor_overlaps(term, instructor, window, exclude))
    }

    fn commit(&self, candidate: CandidateSession) -> Result<ScheduleSession, PersistenceError> {
        let mut guard = self.write()?;
        guard.check_constraints(&candidate, None, None)?;

        let id = SessionId::new(guard.next_id);
        guard.next_id += 1;

        let session = ScheduleSession::from_candidate(id, candidate);
        guard.insert(session.clone());

        log::debug!("SessionStore: committed session {} ({} sessions stored).", id, guard.slots.len());
        Ok(session)
    }

    fn update(&self, id: SessionId, candidate: CandidateSession) -> Result<ScheduleSession, PersistenceError> {
        let mut guard = self.write()?;

        let key = *guard.id_index.get(&id).ok_or(PersistenceError::UnknownSession(id))?;
        let previous = guard.slots.get(key).cloned().ok_or(PersistenceError::UnknownSession(id))?;
        guard.check_constraints(&candidate, Some(id), Some(&previous))?;

        guard.unindex(&previous);

        let session = ScheduleSession::from_candidate(id, candidate);
        guard.index(&session);
        if let Some(slot) = guard.slots.get_mut(key) {
            *slot = session.clone();
        }

        Ok(session)
    }

    fn delete(&self, id: SessionId) -> Result<ScheduleSession, PersistenceError> {
        let mut guard = self.write()?;

        let key = guard.id_index.remove(&id).ok_or(PersistenceError::UnknownSession(id))?;
        let session = guard.slots.remove(key).ok_or(PersistenceError::UnknownSession(id))?;
        guard.unindex(&session);

        Ok(session)
    }

    fn get(&self, id: SessionId) -> Result<Option<ScheduleSession>, PersistenceError> {
        Ok(self.read()?.session(&id).cloned())
    }

    fn list(&self, term: &Term) -> Result<Vec<ScheduleSession>, PersistenceError> {
        let guard = self.read()?;
        let sessions = guard.slots.values().filter(|session| session.term == *term).cloned().collect();
        Ok(StoreInner::sorted_newest_first(sessions))
    }

    fn list_for_room(&self, term: &Term, room: RoomId) -> Result<Vec<ScheduleSession>, PersistenceError> {
        let guard = self.read()?;
        let sessions = guard.slots.values().filter(|session| session.term == *term && session.room == Some(room)).cloned().collect();
        Ok(StoreInner::sorted_newest_first(sessions))
    }

    fn list_for_instructor(&self, term: &Term, instructor: InstructorId) -> Result<Vec<ScheduleSession>, PersistenceError> {
        let guard = self.read()?;
        let sessions = guard
            .slots
            .values()
            .filter(|session| session.term == *term && session.instructor == Some(instructor))
            .cloned()
            .collect();
        Ok(StoreInner::sorted_newest_first(sessions))
    }

    fn len(&self) -> Result<usize, PersistenceError> {
        Ok(self.read()?.slots.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::schedule_session::{ClassType, Section};
    use crate::domain::utils::id::{CurriculumSubjectId, UserId};
    use chrono::NaiveTime;

    fn window(day: Weekday, start: u32, end: u32) -> TimeWindow {
        TimeWindow::new(Some(day), NaiveTime::from_hms_opt(start, 0, 0).unwrap(), NaiveTime::from_hms_opt(end, 0, 0).unwrap()).unwrap()
    }

    fn candidate(subject: i64, room: Option<i64>, instructor: Option<i64>, window: Option<TimeWindow>) -> CandidateSession {
        CandidateSession {
            term: Term::new(2020, 1),
            subject: CurriculumSubjectId::new(subject),
            room: room.map(RoomId::new),
            instructor: instructor.map(InstructorId::new),
            window,
            section: Section { block: 1, batch: 1 },
            class_type: ClassType::Lecture,
            last_updated_by: UserId::new(1),
        }
    }

    #[test]
    fn commit_assigns_increasing_ids() {
        let store = SessionStore::new();
        let first = store.commit(candidate(1, Some(1), None, Some(window(Weekday::Mon, 9, 10)))).unwrap();
        let second = store.commit(candidate(2, Some(1), None, Some(window(Weekday::Mon, 10, 11)))).unwrap();

        assert_eq!(first.id, SessionId::new(1));
        assert_eq!(second.id, SessionId::new(2));
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn room_query_respects_term_day_and_boundaries() {
        let store = SessionStore::new();
        store.commit(candidate(1, Some(3), None, Some(window(Weekday::Mon, 9, 10)))).unwrap();

        let term = Term::new(2020, 1);
        assert!(store.find_room_conflicts(&term, RoomId::new(3), &window(Weekday::Mon, 10, 11), None).unwrap().is_empty());
        assert!(store.find_room_conflicts(&term, RoomId::new(3), &window(Weekday::Tue, 9, 10), None).unwrap().is_empty());
        assert!(store.find_room_conflicts(&Term::new(2020, 2), RoomId::new(3), &window(Weekday::Mon, 9, 10), None).unwrap().is_empty());
        assert_eq!(store.find_room_conflicts(&term, RoomId::new(3), &window(Weekday::Mon, 8, 12), None).unwrap().len(), 1);
    }

    #[test]
    fn exclude_hides_the_session_itself() {
        let store = SessionStore::new();
        let stored = store.commit(candidate(1, Some(3), Some(7), Some(window(Weekday::Mon, 9, 10)))).unwrap();
        let term = Term::new(2020, 1);

        assert!(store.find_room_conflicts(&term, RoomId::new(3), &window(Weekday::Mon, 9, 10), Some(stored.id)).unwrap().is_empty());
        assert!(store.find_instructor_sessions(&term, InstructorId::new(7), &window(Weekday::Mon, 9, 10), Some(stored.id)).unwrap().is_empty());
        assert!(store.find_duplicate(&stored.section_key(), Some(stored.id)).unwrap().is_none());
        assert!(store.find_duplicate(&stored.section_key(), None).unwrap().is_some());
    }

    #[test]
    fn commit_enforces_storage_constraints() {
        let store = SessionStore::new();
        store.commit(candidate(1, Some(3), Some(7), Some(window(Weekday::Mon, 9, 10)))).unwrap();

        let room_clash = store.commit(candidate(2, Some(3), None, Some(window(Weekday::Mon, 9, 11))));
        assert!(matches!(room_clash, Err(PersistenceError::ConstraintViolation { constraint: StorageConstraint::Room, .. })));

        let instructor_clash = store.commit(candidate(3, Some(4), Some(7), Some(window(Weekday::Mon, 9, 11))));
        assert!(matches!(instructor_clash, Err(PersistenceError::ConstraintViolation { constraint: StorageConstraint::Instructor, .. })));

        let section_clash = store.commit(candidate(1, None, None, None));
        assert!(matches!(section_clash, Err(PersistenceError::ConstraintViolation { constraint: StorageConstraint::Section, .. })));

        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn update_moves_index_entries() {
        let store = SessionStore::new();
        let stored = store.commit(candidate(1, Some(3), None, Some(window(Weekday::Mon, 9, 10)))).unwrap();
        let term = Term::new(2020, 1);

        store.update(stored.id, candidate(1, Some(4), None, Some(window(Weekday::Tue, 9, 10)))).unwrap();

        assert!(store.find_room_conflicts(&term, RoomId::new(3), &window(Weekday::Mon, 9, 10), None).unwrap().is_empty());
        assert_eq!(store.find_room_conflicts(&term, RoomId::new(4), &window(Weekday::Tue, 9, 10), None).unwrap().len(), 1);
        assert_eq!(store.list_for_room(&term, RoomId::new(4)).unwrap().len(), 1);
    }

    #[test]
    fn delete_frees_the_slot() {
        let store = SessionStore::new();
        let stored = store.commit(candidate(1, Some(3), None, Some(window(Weekday::Mon, 9, 10)))).unwrap();

        store.delete(stored.id).unwrap();

        assert!(store.get(stored.id).unwrap().is_none());
        assert!(store.commit(candidate(1, Some(3), None, Some(window(Weekday::Mon, 9, 10)))).is_ok());
        assert!(matches!(store.delete(stored.id), Err(PersistenceError::UnknownSession(_))));
    }

    #[test]
    fn restore_keeps_ids_and_advances_the_counter() {
        let store = SessionStore::new();
        let restored = ScheduleSession::from_candidate(SessionId::new(41), candidate(1, None, None, None));
        store.restore(restored.clone()).unwrap();

        assert!(matches!(store.restore(restored), Err(PersistenceError::DuplicateId(_))));
        let next = store.commit(candidate(2, None, None, None)).unwrap();
        assert_eq!(next.id, SessionId::new(42));
    }

    #[test]
    fn list_is_newest_first_and_term_scoped() {
        let store = SessionStore::new();
        store.commit(candidate(1, None, None, None)).unwrap();
        store.commit(candidate(2, None, None, None)).unwrap();

        let ids: Vec<i64> = store.list(&Term::new(2020, 1)).unwrap().iter().map(|session| session.id.value()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(store.list(&Term::new(2021, 1)).unwrap().is_empty());
    }

    #[test]
    fn update_only_rechecks_changed_constraints() {
        let store = SessionStore::new();
        let legacy = ScheduleSession::from_candidate(SessionId::new(1), candidate(1, Some(3), None, Some(window(Weekday::Mon, 9, 10))));
        let clashing = ScheduleSession::from_candidate(SessionId::new(2), candidate(2, Some(3), None, Some(window(Weekday::Mon, 9, 11))));
        store.restore(legacy).unwrap();
        store.restore(clashing).unwrap();

        let mut new_section = candidate(2, Some(3), None, Some(window(Weekday::Mon, 9, 11)));
        new_section.section.block = 2;
        assert!(store.update(SessionId::new(2), new_section).is_ok());

        let moved = candidate(2, Some(3), None, Some(window(Weekday::Mon, 9, 12)));
        assert!(matches!(
            store.update(SessionId::new(2), moved),
            Err(PersistenceError::ConstraintViolation { constraint: StorageConstraint::Room, .. })
        ));
    }

    #[test]
    fn restored_duplicate_sections_stay_visible_after_one_is_removed() {
        let store = SessionStore::new();
        let first = ScheduleSession::from_candidate(SessionId::new(1), candidate(5, None, None, Some(window(Weekday::Mon, 9, 10))));
        let second = ScheduleSession::from_candidate(SessionId::new(2), candidate(5, None, None, Some(window(Weekday::Tue, 9, 10))));
        store.restore(first.clone()).unwrap();
        store.restore(second.clone()).unwrap();

        assert_eq!(store.find_duplicate(&first.section_key(), None).unwrap().map(|session| session.id), Some(first.id));
        assert_eq!(store.find_duplicate(&first.section_key(), Some(first.id)).unwrap().map(|session| session.id), Some(second.id));

        store.delete(second.id).unwrap();

        assert_eq!(store.find_duplicate(&first.section_key(), None).unwrap().map(|session| session.id), Some(first.id));
        let third = store.commit(candidate(5, None, None, Some(window(Weekday::Fri, 9, 10))));
        assert!(matches!(third, Err(PersistenceError::ConstraintViolation { constraint: StorageConstraint::Section, .. })));
    }
}
