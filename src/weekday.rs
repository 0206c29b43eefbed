//! Weekday resolution
//!
//! Turns "the next <weekday> at <time>" into an absolute naive date-time,
//! relative to an explicitly passed current moment. No timezone conversion
//! is performed; every value is a local wall-clock value.

use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta};
use tracing::debug;

use crate::{Result, SchedulerError};

/// A clock time without date or timezone
pub type WallTime = NaiveTime;

/// Canonical weekday ordering used for date arithmetic (monday = 0)
pub const WEEK: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Look up the weekday index for an English day name, ignoring case.
pub fn weekday_index(name: &str) -> Result<u32> {
    let normalized = name.trim().to_lowercase();
    WEEK.iter()
        .position(|day| *day == normalized)
        .map(|index| index as u32)
        .ok_or_else(|| SchedulerError::InvalidWeekday(name.to_string()))
}

/// Parse a wall time in "HH:MM AM|PM" form, e.g. "6:00 PM".
pub fn parse_wall_time(text: &str) -> Result<WallTime> {
    NaiveTime::parse_from_str(text.trim(), "%I:%M %p")
        .map_err(|_| SchedulerError::InvalidTime(text.to_string()))
}

/// Resolve the next occurrence of `day` at `time`, on or after `now`'s date.
///
/// Today is returned only when `day` is today and `time` is strictly later
/// than the current time of day. Otherwise a passed same-day time lands
/// exactly one week ahead.
pub fn resolve_target(day: &str, time: WallTime, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let target_index = i64::from(weekday_index(day)?);
    let today = now.date();
    let today_index = i64::from(today.weekday().num_days_from_monday());

    let days_ahead = if target_index == today_index && now.time() < time {
        0
    } else if target_index > today_index {
        target_index - today_index
    } else {
        7 - (today_index - target_index)
    };

    let target = (today + TimeDelta::days(days_ahead)).and_time(time);
    debug!(day, days_ahead, %target, "Resolved target date");
    Ok(target)
}
