use serde::Serialize;

use crate::domain::admission::admission_state::AdmissionOperation;
use crate::domain::conflict::finding::{ConflictFinding, InstructorConflictKind};
use crate::domain::time_window::{TimeWindow, format_12h, weekday_name};
use crate::domain::utils::id::InstructorId;

/// Human readable rejection, in the response shape schedule clients already understand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectionDto {
    pub message: String,
    pub schedule_conflict: ScheduleConflictDto,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleConflictDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_conflict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_conflict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_conflict: Option<InstructorConflictDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstructorConflictDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_conflict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_conflict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_availability: Option<String>,
}

fn span(window: &TimeWindow) -> String {
    format!("from {} to {}", format_12h(window.start), format_12h(window.end))
}

fn instructor_label(instructor: InstructorId, name: &Option<String>) -> String {
    name.clone().unwrap_or_else(|| format!("Instructor {}", instructor))
}

impl RejectionDto {
    pub fn new(operation: AdmissionOperation, findings: &[ConflictFinding]) -> Self {
        let message = match operation {
            AdmissionOperation::Submit => "Failed to create new class schedule.",
            AdmissionOperation::Update => "Failed to update class schedule.",
            AdmissionOperation::Delete => "Failed to delete class schedule.",
        };

        let mut conflicts = ScheduleConflictDto::default();
        for finding in findings {
            match finding {
                ConflictFinding::RoomConflict { room, conflicting_window, .. } => {
                    conflicts.room_conflict = Some(format!("Room {} is already scheduled {}.", room, span(conflicting_window)));
                }
                ConflictFinding::DuplicateConflict { .. } => {
                    conflicts.duplicate_conflict = Some("This subject already has a schedule.".to_string());
                }
                ConflictFinding::InstructorConflict { instructor, instructor_name, kind } => {
                    let label = instructor_label(*instructor, instructor_name);
                    let details = conflicts.instructor_conflict.get_or_insert_with(InstructorConflictDto::default);

                    match kind {
                        InstructorConflictKind::NotPreferred { .. } => {
                            details.preferred_error = Some("This subject is not preferred by the selected instructor.".to_string());
                        }
                        InstructorConflictKind::OutsideAvailability { available } => {
                            let day = available.weekday.map(weekday_name).unwrap_or("daily");
                            details.availability_conflict = Some(format!("{}'s {} time availability is {}.", label, day, span(available)));
                        }
                        InstructorConflictKind::DoubleBooked { conflicting_window, .. } => {
                            details.schedule_conflict = Some(format!("{} already has a schedule {}.", label, span(conflicting_window)));
                        }
                        InstructorConflictKind::MissingAvailability { weekday } => {
                            details.missing_availability = Some(match weekday {
                                Some(day) => format!("{} has no time availability on {}.", label, weekday_name(*day)),
                                None => format!("{} has no time availability for a session without a day.", label),
                            });
                        }
                    }
                }
            }
        }

        RejectionDto { message: message.to_string(), schedule_conflict: conflicts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::utils::id::{CurriculumSubjectId, RoomId, SessionId};
    use chrono::{NaiveTime, Weekday};

    fn window(day: Weekday, start: u32, end: u32) -> TimeWindow {
        TimeWindow::new(Some(day), NaiveTime::from_hms_opt(start, 0, 0).unwrap(), NaiveTime::from_hms_opt(end, 0, 0).unwrap()).unwrap()
    }

    #[test]
    fn renders_room_and_instructor_messages() {
        let findings = vec![
            ConflictFinding::RoomConflict { room: RoomId::new(3), conflicting_window: window(Weekday::Mon, 9, 10), existing_session: SessionId::new(1), total: 1 },
            ConflictFinding::InstructorConflict {
                instructor: InstructorId::new(7),
                instructor_name: Some("Ada Lovelace".to_string()),
                kind: InstructorConflictKind::OutsideAvailability { available: window(Weekday::Mon, 13, 17) },
            },
            ConflictFinding::InstructorConflict {
                instructor: InstructorId::new(7),
                instructor_name: None,
                kind: InstructorConflictKind::NotPreferred { subject: CurriculumSubjectId::new(5) },
            },
        ];

        let rejection = RejectionDto::new(AdmissionOperation::Submit, &findings);

        assert_eq!(rejection.message, "Failed to create new class schedule.");
        assert_eq!(rejection.schedule_conflict.room_conflict.as_deref(), Some("Room 3 is already scheduled from 9:00AM to 10:00AM."));
        let instructor = rejection.schedule_conflict.instructor_conflict.unwrap();
        assert_eq!(instructor.availability_conflict.as_deref(), Some("Ada Lovelace's Monday time availability is from 1:00PM to 5:00PM."));
        assert!(instructor.preferred_error.is_some());
        assert!(instructor.schedule_conflict.is_none());
    }

    #[test]
    fn absent_categories_are_left_out_of_the_json() {
        let findings = vec![ConflictFinding::InstructorConflict {
            instructor: InstructorId::new(2),
            instructor_name: None,
            kind: InstructorConflictKind::MissingAvailability { weekday: Some(Weekday::Fri) },
        }];

        let json = serde_json::to_value(RejectionDto::new(AdmissionOperation::Update, &findings)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "message": "Failed to update class schedule.",
                "schedule_conflict": {
                    "instructor_conflict": { "missing_availability": "Instructor 2 has no time availability on Friday." }
                }
            })
        );
    }
}
