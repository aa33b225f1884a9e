#[allow(clippy::module_inception)]
pub mod instructor;
pub mod instructor_directory;
pub mod profile_lookup;
