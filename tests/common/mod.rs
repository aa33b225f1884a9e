#![allow(dead_code)]

use class_schedule_admission::api::session_dto::SessionRequestDto;
use class_schedule_admission::domain::admission::admission_config::AdmissionConfig;
use class_schedule_admission::domain::admission::admission_controller::AdmissionController;
use class_schedule_admission::domain::conflict::finding::ConflictFinding;
use class_schedule_admission::domain::session::schedule_session::{ScheduleSession, Term};
use class_schedule_admission::domain::timetable::Timetable;
use class_schedule_admission::error::AdmissionError;
use class_schedule_admission::load_timetable;

pub fn data_path(file: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), file)
}

pub fn timetable() -> Timetable {
    load_timetable(&data_path("timetable.json")).expect("fixture timetable must load")
}

pub fn controller(timetable: &Timetable) -> AdmissionController {
    timetable.controller(AdmissionConfig::default()).unwrap()
}

pub fn term() -> Term {
    Term::new(2020, 1)
}

/// `{day: Monday, 9:00AM-10:00AM, subject 5, room 3, instructor 7, block 1, batch 1, lecture, AY 2020 / Sem 1}`
pub fn monday_request() -> SessionRequestDto {
    SessionRequestDto {
        day: Some("Monday".to_string()),
        time_start: Some("9:00AM".to_string()),
        time_end: Some("10:00AM".to_string()),
        subject_id: Some(5),
        room_id: Some(3),
        instructor_id: Some(7),
        block: Some(1),
        batch: Some(1),
        class_type: Some("lecture".to_string()),
        academic_year_id: Some(2020),
        semester_id: Some(1),
    }
}

pub fn rejection(result: Result<ScheduleSession, AdmissionError>) -> Vec<ConflictFinding> {
    match result {
        Err(AdmissionError::Conflict(findings)) => findings,
        other => panic!("expected a conflict rejection, got {:?}", other),
    }
}
