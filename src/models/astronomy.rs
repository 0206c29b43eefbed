//! Astronomy feed model (sun phase for a location and day)

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::de;
use crate::weekday::WallTime;

/// Hour and minute pair as reported by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourMinute {
    /// Hour of day (0-23)
    #[serde(deserialize_with = "de::number")]
    pub hour: u32,
    /// Minute of hour (0-59)
    #[serde(deserialize_with = "de::number")]
    pub minute: u32,
}

impl HourMinute {
    /// Convert to a wall time, `None` when out of range
    #[must_use]
    pub fn to_wall_time(self) -> Option<WallTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
    }
}

/// Sunrise and sunset of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunPhase {
    pub sunrise: HourMinute,
    pub sunset: HourMinute,
}

/// Snapshot of the astronomy feed
///
/// Only `sun_phase` is required; the rest of the payload (moon phase,
/// response metadata) is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstronomyRecord {
    pub sun_phase: SunPhase,
}

impl AstronomyRecord {
    /// Key that must be present in a valid astronomy payload
    pub const REQUIRED_KEY: &'static str = "sun_phase";

    #[must_use]
    pub fn sunset(&self) -> Option<WallTime> {
        self.sun_phase.sunset.to_wall_time()
    }

    #[must_use]
    pub fn sunrise(&self) -> Option<WallTime> {
        self.sun_phase.sunrise.to_wall_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "moon_phase": {"percentIlluminated": "100", "sunset": {"hour": "19", "minute": "12"}},
        "sun_phase": {
            "sunrise": {"hour": "7", "minute": "27"},
            "sunset": {"hour": "19", "minute": "12"}
        }
    }"#;

    #[test]
    fn test_parse_sample_astronomy() {
        let record: AstronomyRecord = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(record.sunset(), NaiveTime::from_hms_opt(19, 12, 0));
        assert_eq!(record.sunrise(), NaiveTime::from_hms_opt(7, 27, 0));
    }

    #[test]
    fn test_unquoted_numbers_are_accepted() {
        let json = r#"{"sun_phase": {"sunrise": {"hour": 6, "minute": 5}, "sunset": {"hour": 20, "minute": 45}}}"#;
        let record: AstronomyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.sunset(), NaiveTime::from_hms_opt(20, 45, 0));
    }

    #[test]
    fn test_missing_sun_phase_is_rejected() {
        let json = r#"{"moon_phase": {}}"#;
        assert!(serde_json::from_str::<AstronomyRecord>(json).is_err());
    }

    #[test]
    fn test_out_of_range_time_has_no_wall_time() {
        let hm = HourMinute {
            hour: 25,
            minute: 0,
        };
        assert!(hm.to_wall_time().is_none());
    }
}
