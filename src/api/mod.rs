pub mod config_dto;
pub mod finding_dto;
pub mod session_dto;
pub mod timetable_dto;
