use std::sync::Arc;

use crate::api::session_dto::ScheduleSessionDto;
use crate::api::timetable_dto::{AvailabilityDto, PreferredSubjectDto, TimetableDto};
use crate::domain::admission::admission_config::AdmissionConfig;
use crate::domain::admission::admission_controller::AdmissionController;
use crate::domain::instructor::instructor::{CurriculumSubject, Instructor, InstructorAvailability, InstructorPreferredSubject};
use crate::domain::instructor::instructor_directory::InstructorDirectory;
use crate::domain::session::schedule_session::{ScheduleSession, Term};
use crate::domain::session::session_store::SessionStore;
use crate::domain::time_window::{TimeWindow, parse_weekday};
use crate::domain::utils::id::{CurriculumSubjectId, InstructorId, SubjectId};
use crate::error::{Error, Result};

/// Committed sessions plus the instructor reference data they are checked against.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    pub sessions: SessionStore,
    pub profiles: InstructorDirectory,
    /// Reference data as loaded, written back unchanged on save.
    reference: TimetableDto,
}

impl TryFrom<AvailabilityDto> for InstructorAvailability {
    type Error = Error;

    fn try_from(dto: AvailabilityDto) -> Result<Self> {
        let weekday = parse_weekday(&dto.day)?;
        let window = TimeWindow::normalize(Some(&dto.day), Some(&dto.time_start), Some(&dto.time_end))?
            .ok_or_else(|| Error::ModelConstructionError(format!("Availability of instructor {} has no window.", dto.instructor_id)))?;

        Ok(InstructorAvailability {
            instructor: InstructorId::new(dto.instructor_id),
            term: Term::new(dto.academic_year_id, dto.semester_id),
            weekday,
            window,
            active: dto.active,
        })
    }
}

impl From<PreferredSubjectDto> for InstructorPreferredSubject {
    fn from(dto: PreferredSubjectDto) -> Self {
        InstructorPreferredSubject {
            instructor: InstructorId::new(dto.instructor_id),
            term: Term::new(dto.academic_year_id, dto.semester_id),
            subject: SubjectId::new(dto.subject_id),
            active: dto.active,
        }
    }
}

impl Timetable {
    pub fn from_dto(dto: TimetableDto) -> Result<Self> {
        let mut profiles = InstructorDirectory::new();

        for instructor in &dto.instructors {
            profiles.add_instructor(Instructor {
                id: InstructorId::new(instructor.id),
                first_name: instructor.first_name.clone(),
                middle_name: instructor.middle_name.clone(),
                last_name: instructor.last_name.clone(),
            });
        }

        for curriculum_subject in &dto.curriculum_subjects {
            profiles.add_curriculum_subject(CurriculumSubject {
                id: CurriculumSubjectId::new(curriculum_subject.id),
                subject: SubjectId::new(curriculum_subject.subject_id),
            });
        }

        for availability in &dto.availabilities {
            profiles.add_availability(InstructorAvailability::try_from(availability.clone())?);
        }

        for preference in &dto.preferred_subjects {
            profiles.add_preferred_subject(preference.clone().into());
        }

        let sessions = SessionStore::new();
        for session_dto in &dto.sessions {
            let session = ScheduleSession::try_from(session_dto.clone())?;
            sessions.restore(session)?;
        }

        log::info!(
            "Timetable loaded: {} sessions, {} instructors, {} availability records, {} preferences.",
            dto.sessions.len(),
            profiles.instructor_count(),
            dto.availabilities.len(),
            dto.preferred_subjects.len()
        );

        Ok(Timetable { sessions, profiles, reference: TimetableDto { sessions: Vec::new(), ..dto } })
    }

    /// The reference data as loaded and the sessions as they are now.
    pub fn to_dto(&self) -> Result<TimetableDto> {
        let sessions = self.sessions.snapshot()?.iter().map(ScheduleSessionDto::from).collect();
        Ok(TimetableDto { sessions, ..self.reference.clone() })
    }

    /// A controller working on this timetable. Sessions it commits are visible through
    /// `self.sessions`, they share storage.
    pub fn controller(&self, config: AdmissionConfig) -> Result<AdmissionController> {
        AdmissionController::open(Arc::new(self.sessions.clone()), Arc::new(self.profiles.clone()), config)
    }
}
