pub mod schedule_session;
pub mod session_patch;
pub mod session_repository;
pub mod session_store;
