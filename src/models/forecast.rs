//! Hourly forecast feed model
//!
//! Values are kept as the text the feed sent so that templates render them
//! verbatim (`"40"` stays `"40"`, `"-9999"` stays `"-9999"`).

use serde::{Deserialize, Serialize};

use super::de;

/// Hourly forecast series, in the order the feed delivered it
///
/// Entries without a readable timestamp are dropped; the rest are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecastSeries {
    #[serde(deserialize_with = "de::skip_invalid")]
    pub hourly_forecast: Vec<ForecastEntry>,
}

impl HourlyForecastSeries {
    /// Key that must be present in a valid hourly payload
    pub const REQUIRED_KEY: &'static str = "hourly_forecast";

    #[must_use]
    pub fn entries(&self) -> &[ForecastEntry] {
        &self.hourly_forecast
    }
}

/// Timestamp breakdown of a forecast entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastTime {
    /// Hour of day (0-23)
    #[serde(deserialize_with = "de::number")]
    pub hour: u32,
    /// Day of month (1-31)
    #[serde(deserialize_with = "de::number")]
    pub mday: u32,
    /// Month (1-12), 0 when the feed omitted it
    #[serde(default, deserialize_with = "de::number_or_default")]
    pub mon: u32,
    /// Year, 0 when the feed omitted it
    #[serde(default, deserialize_with = "de::number_or_default")]
    pub year: i32,
    /// Pretty-printed timestamp, e.g. "7:00 PM CDT on March 22, 2017"
    #[serde(default, deserialize_with = "de::text")]
    pub pretty: String,
}

/// A value reported in both english and metric units
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPair {
    #[serde(default, deserialize_with = "de::text")]
    pub english: String,
    #[serde(default, deserialize_with = "de::text")]
    pub metric: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindDirection {
    /// Compass direction, e.g. "SE"
    #[serde(default, deserialize_with = "de::text")]
    pub dir: String,
    #[serde(default, deserialize_with = "de::text")]
    pub degrees: String,
}

/// One hourly forecast record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    #[serde(rename = "FCTTIME")]
    pub time: ForecastTime,
    #[serde(default, deserialize_with = "de::text")]
    pub condition: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub temp: UnitPair,
    #[serde(default, deserialize_with = "de::or_default")]
    pub dewpoint: UnitPair,
    #[serde(default, deserialize_with = "de::or_default")]
    pub feelslike: UnitPair,
    #[serde(default, deserialize_with = "de::or_default")]
    pub heatindex: UnitPair,
    #[serde(default, deserialize_with = "de::or_default")]
    pub windchill: UnitPair,
    #[serde(default, deserialize_with = "de::or_default")]
    pub wspd: UnitPair,
    #[serde(default, deserialize_with = "de::or_default")]
    pub wdir: WindDirection,
    #[serde(default, deserialize_with = "de::or_default")]
    pub snow: UnitPair,
    /// Quantitative precipitation forecast
    #[serde(default, deserialize_with = "de::or_default")]
    pub qpf: UnitPair,
    /// Mean sea-level pressure
    #[serde(default, deserialize_with = "de::or_default")]
    pub mslp: UnitPair,
    #[serde(default, deserialize_with = "de::text")]
    pub humidity: String,
    /// Probability of precipitation (percent)
    #[serde(default, deserialize_with = "de::text")]
    pub pop: String,
    /// Cloud cover percent
    #[serde(default, deserialize_with = "de::text")]
    pub sky: String,
    #[serde(default, deserialize_with = "de::text")]
    pub uvi: String,
    /// Short weather condition, e.g. "Showers"
    #[serde(default, deserialize_with = "de::text")]
    pub wx: String,
}
