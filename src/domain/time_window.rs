use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Accepted spellings of a time of day, tried in order. Whitespace in a format
/// matches any amount of input whitespace, so `9:00AM` and `9:00 am` both parse.
const TIME_FORMATS: [&str; 3] = ["%I:%M %p", "%H:%M", "%H:%M:%S"];

/// Half-open interval `[start, end)` of a single day.
///
/// `start < end` always holds; a class running past midnight cannot be expressed.
/// The weekday is optional because a session may carry a time slot without a day,
/// in which case it never overlaps anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub weekday: Option<Weekday>,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(weekday: Option<Weekday>, start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyWindow { start, end });
        }

        Ok(TimeWindow { weekday, start, end })
    }

    /// Strict overlap: same weekday and `start_a < end_b && start_b < end_a`.
    ///
    /// Back-to-back windows (`a.end == b.start`) do not overlap, which is what
    /// makes consecutive classes in the same room legal.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        if self.weekday.is_none() || self.weekday != other.weekday {
            return false;
        }

        self.start < other.end && other.start < self.end
    }

    /// `true` if `inner` lies completely inside `self`. Only the times are compared;
    /// callers pick windows of the same day.
    pub fn contains(&self, inner: &TimeWindow) -> bool {
        self.start <= inner.start && inner.end <= self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Builds the window of a session from already typed parts.
    ///
    /// # Returns
    /// `Ok(None)` for an unscheduled session (no day, no times).
    pub fn from_parts(
        weekday: Option<Weekday>,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    ) -> Result<Option<TimeWindow>, ValidationError> {
        match (start, end) {
            (Some(start), Some(end)) => TimeWindow::new(weekday, start, end).map(Some),
            (None, None) if weekday.is_none() => Ok(None),
            _ => Err(ValidationError::IncompleteWindow),
        }
    }

    /// Normalizes the human-entered day and 12-hour times of a request into a
    /// canonical window. This is the only place request times are interpreted.
    pub fn normalize(day: Option<&str>, time_start: Option<&str>, time_end: Option<&str>) -> Result<Option<TimeWindow>, ValidationError> {
        let weekday = day.map(parse_weekday).transpose()?;
        let start = time_start.map(|value| parse_time_of_day("time_start", value)).transpose()?;
        let end = time_end.map(|value| parse_time_of_day("time_end", value)).transpose()?;

        TimeWindow::from_parts(weekday, start, end)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.weekday {
            Some(day) => write!(f, "{} {}-{}", day, format_24h(self.start), format_24h(self.end)),
            None => write!(f, "{}-{}", format_24h(self.start), format_24h(self.end)),
        }
    }
}

/// Parses `Monday`, `monday`, `Mon`, ... into a weekday.
pub fn parse_weekday(value: &str) -> Result<Weekday, ValidationError> {
    value.trim().parse::<Weekday>().map_err(|_| ValidationError::InvalidWeekday(value.to_string()))
}

/// Parses a 12-hour (`9:00AM`, `9:00 pm`, `9AM`) or 24-hour (`09:00`, `09:00:00`)
/// time of day, truncated to whole minutes.
pub fn parse_time_of_day(field: &'static str, value: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = value.trim().to_ascii_uppercase();

    // chrono needs minutes, so `9AM` becomes `9:00AM`.
    let with_minutes = if trimmed.contains(':') {
        trimmed
    } else {
        let digits_end = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
        format!("{}:00{}", &trimmed[..digits_end], &trimmed[digits_end..])
    };

    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&with_minutes, format).ok())
        .and_then(|time| NaiveTime::from_hms_opt(time.hour(), time.minute(), 0))
        .ok_or_else(|| ValidationError::InvalidTime { field, value: value.to_string() })
}

/// `Monday`, `Tuesday`, ... as entered in requests.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Canonical `HH:MM` form used for storage and output.
pub fn format_24h(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// `9:00AM` form used in human readable conflict messages.
pub fn format_12h(time: NaiveTime) -> String {
    time.format("%-I:%M%p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn window(day: Weekday, start: (u32, u32), end: (u32, u32)) -> TimeWindow {
        TimeWindow::new(Some(day), at(start.0, start.1), at(end.0, end.1)).unwrap()
    }

    #[test]
    fn back_to_back_windows_do_not_overlap() {
        let first = window(Weekday::Mon, (9, 0), (10, 0));
        let second = window(Weekday::Mon, (10, 0), (11, 0));

        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn partial_equal_and_enclosing_windows_overlap() {
        let base = window(Weekday::Mon, (9, 0), (10, 0));

        assert!(base.overlaps(&window(Weekday::Mon, (9, 30), (10, 30))));
        assert!(base.overlaps(&window(Weekday::Mon, (9, 0), (10, 0))));
        assert!(base.overlaps(&window(Weekday::Mon, (8, 0), (12, 0))));
        assert!(base.overlaps(&window(Weekday::Mon, (9, 15), (9, 45))));
    }

    #[test]
    fn different_or_missing_weekday_never_overlaps() {
        let monday = window(Weekday::Mon, (9, 0), (10, 0));
        let tuesday = window(Weekday::Tue, (9, 0), (10, 0));
        let no_day = TimeWindow::new(None, at(9, 0), at(10, 0)).unwrap();

        assert!(!monday.overlaps(&tuesday));
        assert!(!monday.overlaps(&no_day));
        assert!(!no_day.overlaps(&no_day));
    }

    #[test]
    fn overlap_is_symmetric_and_boundary_strict_for_random_windows() {
        let mut rng = rand::rng();

        for _ in 0..2_000 {
            let a_start = rng.random_range(0..(24 * 60 - 1));
            let a_end = rng.random_range((a_start + 1)..(24 * 60));
            let b_start = rng.random_range(0..(24 * 60 - 1));
            let b_end = rng.random_range((b_start + 1)..(24 * 60));

            let a = window(Weekday::Wed, (a_start / 60, a_start % 60), (a_end / 60, a_end % 60));
            let b = window(Weekday::Wed, (b_start / 60, b_start % 60), (b_end / 60, b_end % 60));

            assert_eq!(a.overlaps(&b), b.overlaps(&a), "{} vs {}", a, b);
            if a.end == b.start || b.end == a.start {
                assert!(!a.overlaps(&b), "touching windows {} and {} overlapped", a, b);
            }
        }
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let availability = window(Weekday::Fri, (8, 0), (17, 0));

        assert!(availability.contains(&window(Weekday::Fri, (8, 0), (17, 0))));
        assert!(availability.contains(&window(Weekday::Fri, (9, 0), (10, 0))));
        assert!(!availability.contains(&window(Weekday::Fri, (7, 30), (9, 0))));
        assert!(!availability.contains(&window(Weekday::Fri, (16, 0), (17, 30))));
    }

    #[test]
    fn empty_and_inverted_windows_are_rejected() {
        assert!(matches!(TimeWindow::new(None, at(10, 0), at(10, 0)), Err(ValidationError::EmptyWindow { .. })));
        assert!(matches!(TimeWindow::new(None, at(23, 0), at(1, 0)), Err(ValidationError::EmptyWindow { .. })));
    }

    #[test]
    fn parses_twelve_and_twenty_four_hour_inputs() {
        assert_eq!(parse_time_of_day("time_start", "9:00AM").unwrap(), at(9, 0));
        assert_eq!(parse_time_of_day("time_start", "9:00 am").unwrap(), at(9, 0));
        assert_eq!(parse_time_of_day("time_start", "12:30PM").unwrap(), at(12, 30));
        assert_eq!(parse_time_of_day("time_start", "12:00AM").unwrap(), at(0, 0));
        assert_eq!(parse_time_of_day("time_start", "1PM").unwrap(), at(13, 0));
        assert_eq!(parse_time_of_day("time_start", "14:45").unwrap(), at(14, 45));
        assert_eq!(parse_time_of_day("time_start", "14:45:59").unwrap(), at(14, 45));
        assert!(matches!(parse_time_of_day("time_end", "noonish"), Err(ValidationError::InvalidTime { field: "time_end", .. })));
    }

    #[test]
    fn normalize_builds_canonical_window() {
        let window = TimeWindow::normalize(Some("Monday"), Some("9:00AM"), Some("10:00AM")).unwrap().unwrap();

        assert_eq!(window.weekday, Some(Weekday::Mon));
        assert_eq!(format_24h(window.start), "09:00");
        assert_eq!(format_24h(window.end), "10:00");
        assert_eq!(window.to_string(), "Mon 09:00-10:00");
        assert_eq!(format_12h(window.start), "9:00AM");
    }

    #[test]
    fn normalize_handles_unscheduled_and_incomplete_requests() {
        assert_eq!(TimeWindow::normalize(None, None, None).unwrap(), None);
        assert!(matches!(TimeWindow::normalize(Some("Monday"), Some("9:00AM"), None), Err(ValidationError::IncompleteWindow)));
        assert!(matches!(TimeWindow::normalize(Some("Monday"), None, None), Err(ValidationError::IncompleteWindow)));
        assert!(matches!(TimeWindow::normalize(Some("Someday"), Some("9:00AM"), Some("10:00AM")), Err(ValidationError::InvalidWeekday(_))));
    }
}
