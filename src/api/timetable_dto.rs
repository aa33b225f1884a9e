use serde::{Deserialize, Serialize};

use crate::api::session_dto::ScheduleSessionDto;

/// A whole term's worth of schedule data as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableDto {
    #[serde(default)]
    pub instructors: Vec<InstructorDto>,
    #[serde(default)]
    pub curriculum_subjects: Vec<CurriculumSubjectDto>,
    #[serde(default)]
    pub availabilities: Vec<AvailabilityDto>,
    #[serde(default)]
    pub preferred_subjects: Vec<PreferredSubjectDto>,
    #[serde(default)]
    pub sessions: Vec<ScheduleSessionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorDto {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumSubjectDto {
    pub id: i64,
    pub subject_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDto {
    pub instructor_id: i64,
    pub academic_year_id: i64,
    pub semester_id: i64,
    pub day: String,
    pub time_start: String,
    pub time_end: String,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferredSubjectDto {
    pub instructor_id: i64,
    pub academic_year_id: i64,
    pub semester_id: i64,
    pub subject_id: i64,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}
