use std::fmt;

/// Lifecycle of a single admission request. Only the final state is visible to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionState {
    /// The request arrived and its times were normalized.
    Received,

    /// Detectors are running against the current timetable.
    Checking,

    /// At least one finding. Nothing was written.
    Rejected,

    /// The session was written to the repository.
    Committed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOperation {
    Submit,
    Update,
    Delete,
}

impl fmt::Display for AdmissionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionOperation::Submit => write!(f, "Submit"),
            AdmissionOperation::Update => write!(f, "Update"),
            AdmissionOperation::Delete => write!(f, "Delete"),
        }
    }
}
