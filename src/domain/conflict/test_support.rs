//! Builders shared by the detector and admission unit tests.

use chrono::{NaiveTime, Weekday};

use crate::domain::conflict::detector_trait::DetectionContext;
use crate::domain::instructor::instructor::{CurriculumSubject, Instructor, InstructorAvailability, InstructorPreferredSubject};
use crate::domain::instructor::instructor_directory::InstructorDirectory;
use crate::domain::session::schedule_session::{CandidateSession, ClassType, ScheduleSession, Section, Term};
use crate::domain::session::session_repository::SessionRepository;
use crate::domain::session::session_store::SessionStore;
use crate::domain::time_window::TimeWindow;
use crate::domain::utils::id::{CurriculumSubjectId, InstructorId, RoomId, SubjectId, UserId};

pub fn term() -> Term {
    Term::new(2020, 1)
}

pub fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn window(day: Weekday, start: (u32, u32), end: (u32, u32)) -> TimeWindow {
    TimeWindow::new(Some(day), at(start.0, start.1), at(end.0, end.1)).unwrap()
}

pub struct CandidateBuilder {
    candidate: CandidateSession,
}

pub fn candidate() -> CandidateBuilder {
    CandidateBuilder {
        candidate: CandidateSession {
            term: term(),
            subject: CurriculumSubjectId::new(1),
            room: None,
            instructor: None,
            window: None,
            section: Section { block: 1, batch: 1 },
            class_type: ClassType::Lecture,
            last_updated_by: UserId::new(1),
        },
    }
}

impl CandidateBuilder {
    pub fn subject(mut self, id: i64) -> Self {
        self.candidate.subject = CurriculumSubjectId::new(id);
        self
    }

    pub fn room(mut self, id: i64) -> Self {
        self.candidate.room = Some(RoomId::new(id));
        self
    }

    pub fn instructor(mut self, id: i64) -> Self {
        self.candidate.instructor = Some(InstructorId::new(id));
        self
    }

    pub fn block(mut self, block: i64) -> Self {
        self.candidate.section.block = block;
        self
    }

    pub fn batch(mut self, batch: i64) -> Self {
        self.candidate.section.batch = batch;
        self
    }

    pub fn class_type(mut self, class_type: ClassType) -> Self {
        self.candidate.class_type = class_type;
        self
    }

    pub fn on(mut self, day: Weekday, start: (u32, u32), end: (u32, u32)) -> Self {
        self.candidate.window = Some(window(day, start, end));
        self
    }

    pub fn monday(self, start_hour: u32, end_hour: u32) -> Self {
        self.on(Weekday::Mon, (start_hour, 0), (end_hour, 0))
    }

    pub fn tuesday(self, start_hour: u32, end_hour: u32) -> Self {
        self.on(Weekday::Tue, (start_hour, 0), (end_hour, 0))
    }

    pub fn monday_minutes(self, start: (u32, u32), end: (u32, u32)) -> Self {
        self.on(Weekday::Mon, start, end)
    }

    pub fn build(self) -> CandidateSession {
        self.candidate
    }
}

pub struct Fixture {
    pub store: SessionStore,
    pub directory: InstructorDirectory,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture { store: SessionStore::new(), directory: InstructorDirectory::new() }
    }

    pub fn commit(&self, builder: CandidateBuilder) -> ScheduleSession {
        self.store.commit(builder.build()).unwrap()
    }

    pub fn name(&mut self, instructor: i64, first_name: &str, last_name: &str) {
        self.directory.add_instructor(Instructor {
            id: InstructorId::new(instructor),
            first_name: first_name.to_string(),
            middle_name: None,
            last_name: last_name.to_string(),
        });
    }

    /// Catalogue subject ids are the curriculum subject id times ten.
    pub fn prefer(&mut self, instructor: i64, curriculum_subject: i64) {
        self.directory.add_curriculum_subject(CurriculumSubject {
            id: CurriculumSubjectId::new(curriculum_subject),
            subject: SubjectId::new(curriculum_subject * 10),
        });
        self.directory.add_preferred_subject(InstructorPreferredSubject {
            instructor: InstructorId::new(instructor),
            term: term(),
            subject: SubjectId::new(curriculum_subject * 10),
            active: true,
        });
    }

    pub fn available(&mut self, instructor: i64, day: Weekday, start_hour: u32, end_hour: u32) {
        self.directory.add_availability(InstructorAvailability {
            instructor: InstructorId::new(instructor),
            term: term(),
            weekday: day,
            window: window(day, (start_hour, 0), (end_hour, 0)),
            active: true,
        });
    }

    pub fn context(&self) -> DetectionContext<'_> {
        DetectionContext { sessions: &self.store, profiles: &self.directory, exclude: None, require_explicit_availability: false }
    }
}
