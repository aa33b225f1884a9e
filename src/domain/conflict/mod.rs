pub mod detector_trait;
pub mod duplicate_detector;
pub mod finding;
pub mod instructor_detector;
pub mod room_detector;

#[cfg(test)]
pub(crate) mod test_support;
