use chrono::Weekday;

use crate::domain::instructor::instructor::Instructor;
use crate::domain::session::schedule_session::Term;
use crate::domain::time_window::TimeWindow;
use crate::domain::utils::id::{CurriculumSubjectId, InstructorId};
use crate::error::PersistenceError;

/// Read-only view of instructor reference data used by the instructor detector.
pub trait InstructorProfileLookup: std::fmt::Debug + Send + Sync {
    /// The instructor's active availability window for the weekday. When several exist
    /// only the first one counts. `None` means nothing was declared for that day.
    fn get_availability(&self, instructor: InstructorId, term: &Term, weekday: Weekday) -> Result<Option<TimeWindow>, PersistenceError>;

    /// Whether the instructor has an active preference for the subject behind the
    /// curriculum subject in this term.
    fn is_subject_preferred(&self, instructor: InstructorId, term: &Term, subject: CurriculumSubjectId) -> Result<bool, PersistenceError>;

    /// Name context for findings. Unknown instructors simply have no name attached.
    fn get_instructor(&self, instructor: InstructorId) -> Result<Option<Instructor>, PersistenceError>;
}
