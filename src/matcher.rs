//! Selection of the hourly forecast entry for a target date-time

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::models::ForecastEntry;
use crate::{Result, SchedulerError};

/// Return the first entry, in feed order, whose day-of-month and hour equal
/// the target's.
///
/// Month and year are not compared: near a month boundary an entry from a
/// different month with the same day and hour would be selected.
#[must_use]
pub fn match_forecast(series: &[ForecastEntry], target: NaiveDateTime) -> Option<&ForecastEntry> {
    let (day, hour) = (target.day(), target.hour());
    series
        .iter()
        .find(|entry| entry.time.mday == day && entry.time.hour == hour)
}

/// Like [`match_forecast`] but reports a miss as [`SchedulerError::ForecastNotMatched`].
pub fn require_match(series: &[ForecastEntry], target: NaiveDateTime) -> Result<&ForecastEntry> {
    match_forecast(series, target).ok_or(SchedulerError::ForecastNotMatched {
        day: target.day(),
        hour: target.hour(),
    })
}
