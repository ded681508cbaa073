//! Ready-made recurring windows: days of the week, times of day, business hours.
//!
//! All of them are plain [`RecurringPattern`]s, so they need a finite query start
//! and combine with calendars through the usual operators.

use chrono::Weekday;

use crate::error::{AlgebraError, Result};
use crate::interval::{DAY, HOUR};
use crate::recurrence::{recurring, Frequency, RecurrenceRule};
use crate::timeline::Node;

const WORKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// Whole days (local midnight to midnight) falling on `days`.
pub fn day_of_week(days: impl IntoIterator<Item = Weekday>, tz: &str) -> Result<Node> {
    let days: Vec<Weekday> = days.into_iter().collect();
    if days.is_empty() {
        return Err(AlgebraError::InvalidArgument(
            "day_of_week() needs at least one day, e.g. day_of_week([Weekday::Mon], \"UTC\")"
                .to_string(),
        ));
    }
    recurring(
        RecurrenceRule::new(Frequency::Weekly)
            .on(days)
            .window(0, DAY)
            .tz(tz),
    )
}

/// A daily window starting `start_hour` hours after midnight (fractions allowed).
///
/// The window may not cross midnight; for overnight spans build a daily
/// [`RecurrenceRule`] directly.
pub fn time_of_day(start_hour: f64, duration_hours: f64, tz: &str) -> Result<Node> {
    if !(0.0..24.0).contains(&start_hour) {
        return Err(AlgebraError::InvalidArgument(format!(
            "start_hour must be in [0, 24), got {}. Fractions are allowed: 9.5 = 09:30",
            start_hour
        )));
    }
    if duration_hours.is_nan() || duration_hours <= 0.0 {
        return Err(AlgebraError::InvalidArgument(format!(
            "duration_hours must be positive, got {}",
            duration_hours
        )));
    }
    if start_hour + duration_hours > 24.0 {
        return Err(AlgebraError::InvalidArgument(format!(
            "time_of_day() cannot cross midnight: {} + {} > 24. \
             Use a daily RecurrenceRule for overnight windows",
            start_hour, duration_hours
        )));
    }
    let start = (start_hour * HOUR as f64).round() as u32;
    let duration = (duration_hours * HOUR as f64).round() as i64;
    recurring(
        RecurrenceRule::new(Frequency::Daily)
            .window(start, duration)
            .tz(tz),
    )
}

/// Monday through Friday, all day.
pub fn weekdays(tz: &str) -> Result<Node> {
    day_of_week(WORKDAYS, tz)
}

/// Saturday and Sunday, all day.
pub fn weekends(tz: &str) -> Result<Node> {
    day_of_week([Weekday::Sat, Weekday::Sun], tz)
}

/// Weekdays from `start_hour` up to (not including) `end_hour`.
pub fn business_hours(tz: &str, start_hour: u32, end_hour: u32) -> Result<Node> {
    if start_hour >= 24 || end_hour > 24 || start_hour >= end_hour {
        return Err(AlgebraError::InvalidArgument(format!(
            "business hours need 0 <= start_hour < end_hour <= 24, got {}..{}",
            start_hour, end_hour
        )));
    }
    recurring(
        RecurrenceRule::new(Frequency::Weekly)
            .on(WORKDAYS)
            .window(start_hour * HOUR as u32, i64::from(end_hour - start_hour) * HOUR)
            .tz(tz),
    )
}
