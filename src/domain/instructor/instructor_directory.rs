use chrono::Weekday;
use std::collections::{HashMap, HashSet};

use crate::domain::instructor::instructor::{CurriculumSubject, Instructor, InstructorAvailability, InstructorPreferredSubject};
use crate::domain::instructor::profile_lookup::InstructorProfileLookup;
use crate::domain::session::schedule_session::Term;
use crate::domain::time_window::TimeWindow;
use crate::domain::utils::id::{CurriculumSubjectId, InstructorId, SubjectId};
use crate::error::PersistenceError;

/// In-memory instructor reference data: names, availability, subject preferences and
/// the curriculum-to-catalogue subject mapping.
#[derive(Debug, Default, Clone)]
pub struct InstructorDirectory {
    instructors: HashMap<InstructorId, Instructor>,
    curriculum_subjects: HashMap<CurriculumSubjectId, SubjectId>,
    /// Availability records in insertion order per instructor, term and day.
    availabilities: HashMap<(InstructorId, Term, Weekday), Vec<InstructorAvailability>>,
    preferred_subjects: HashSet<(InstructorId, Term, SubjectId)>,
}

impl InstructorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instructor(&mut self, instructor: Instructor) {
        self.instructors.insert(instructor.id, instructor);
    }

    pub fn add_curriculum_subject(&mut self, curriculum_subject: CurriculumSubject) {
        self.curriculum_subjects.insert(curriculum_subject.id, curriculum_subject.subject);
    }

    pub fn add_availability(&mut self, availability: InstructorAvailability) {
        if availability.window.weekday.is_some_and(|day| day != availability.weekday) {
            log::warn!(
                "Availability of instructor {} is filed under {} but its window says {:?}.",
                availability.instructor,
                availability.weekday,
                availability.window.weekday
            );
        }

        self.availabilities
            .entry((availability.instructor, availability.term, availability.weekday))
            .or_default()
            .push(availability);
    }

    /// Inactive preferences are not stored, they never count.
    pub fn add_preferred_subject(&mut self, preference: InstructorPreferredSubject) {
        if preference.active {
            self.preferred_subjects.insert((preference.instructor, preference.term, preference.subject));
        }
    }

    pub fn instructor_count(&self) -> usize {
        self.instructors.len()
    }
}

impl InstructorProfileLookup for InstructorDirectory {
    fn get_availability(&self, instructor: InstructorId, term: &Term, weekday: Weekday) -> Result<Option<TimeWindow>, PersistenceError> {
        let first_active = self
            .availabilities
            .get(&(instructor, *term, weekday))
            .and_then(|records| records.iter().find(|record| record.active))
            .map(|record| TimeWindow { weekday: Some(weekday), ..record.window });

        Ok(first_active)
    }

    fn is_subject_preferred(&self, instructor: InstructorId, term: &Term, subject: CurriculumSubjectId) -> Result<bool, PersistenceError> {
        match self.curriculum_subjects.get(&subject) {
            Some(catalogue_subject) => Ok(self.preferred_subjects.contains(&(instructor, *term, *catalogue_subject))),
            None => {
                log::warn!("Curriculum subject {} is unknown, treating it as not preferred by instructor {}.", subject, instructor);
                Ok(false)
            }
        }
    }

    fn get_instructor(&self, instructor: InstructorId) -> Result<Option<Instructor>, PersistenceError> {
        Ok(self.instructors.get(&instructor).cloned())
    }
}
