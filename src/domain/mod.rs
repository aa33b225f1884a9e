pub mod admission;
pub mod conflict;
pub mod instructor;
pub mod session;
pub mod time_window;
pub mod timetable;
pub mod utils;
