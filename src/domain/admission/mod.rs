pub mod admission_config;
pub mod admission_controller;
pub mod admission_locks;
pub mod admission_state;
