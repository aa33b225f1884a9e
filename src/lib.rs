use crate::api::timetable_dto::TimetableDto;
use crate::domain::timetable::Timetable;
use crate::error::Result;
use crate::loader::parser::{parse_json_file, write_json_file};

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Reads a timetable file and builds the in-memory timetable from it.
pub fn load_timetable(file_path: &str) -> Result<Timetable> {
    let dto: TimetableDto = parse_json_file(file_path)?;
    log::info!("Timetable file '{}' parsed successfully.", file_path);

    Timetable::from_dto(dto)
}

pub fn save_timetable(file_path: &str, timetable: &Timetable) -> Result<()> {
    write_json_file(file_path, &timetable.to_dto()?)?;
    log::info!("Timetable written to '{}'.", file_path);
    Ok(())
}
