//! Template context construction
//!
//! A [`Context`] is the flat key/value mapping handed to the template
//! renderer. [`ContextBuilder::build`] assembles it in three layers, each a
//! fresh mapping merged over the previous one so that later layers win on
//! key collision:
//!
//! 1. the caller's base context,
//! 2. values computed from the target date-time and astronomy record,
//! 3. fields of the matched forecast entry.
//!
//! Which forecast fields appear, and under which names, is driven by a
//! [`FieldMapping`] table rather than hardcoded.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{AstronomyRecord, ForecastEntry};
use crate::weekday::WallTime;

/// A rendered context value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl ContextValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContextValue::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ContextValue::Text(_) => None,
            ContextValue::Integer(value) => Some(*value as f64),
            ContextValue::Number(value) => Some(*value),
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Text(text) => f.write_str(text),
            ContextValue::Integer(value) => write!(f, "{value}"),
            ContextValue::Number(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Integer(value)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Number(value)
    }
}

/// Flat mapping from field name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, ContextValue>);

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this context with `key` set to `value`
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Overlay `other` on top of this context; keys in `other` win
    #[must_use]
    pub fn merge(mut self, other: Context) -> Self {
        self.0.extend(other.0);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.0.get(key)
    }

    /// Text value of `key`, `None` when absent or numeric
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ContextValue::as_text)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContextValue)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, String>> for Context {
    fn from(pairs: BTreeMap<String, String>) -> Self {
        pairs
            .into_iter()
            .map(|(key, value)| (key, ContextValue::Text(value)))
            .collect()
    }
}

impl FromIterator<(String, ContextValue)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, ContextValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Format a wall time as `%l:%M %p`: no leading zero, a space in its place
/// (`" 7:00 PM"`, `"12:30 AM"`).
#[must_use]
pub fn format_wall_time(time: WallTime) -> String {
    time.format("%l:%M %p").to_string()
}

/// A forecast entry field that can be exposed to templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastField {
    Condition,
    DewpointEnglish,
    DewpointMetric,
    FeelslikeEnglish,
    FeelslikeMetric,
    ForecastTimeDate,
    HeatindexEnglish,
    HeatindexMetric,
    Humidity,
    MeanSeaLevelPressureEnglish,
    MeanSeaLevelPressureMetric,
    PercentCloudCover,
    ProbabilityOfPrecipitation,
    QuantitativePrecipitationEnglish,
    QuantitativePrecipitationMetric,
    SnowEnglish,
    SnowMetric,
    TemperatureEnglish,
    TemperatureMetric,
    UltravioletIndex,
    WeatherCondition,
    WindSpeedEnglish,
    WindSpeedMetric,
    WindDirection,
    WindDegrees,
    WindchillEnglish,
    WindchillMetric,
}

impl ForecastField {
    /// Read this field's text from a forecast entry
    #[must_use]
    pub fn extract(self, entry: &ForecastEntry) -> &str {
        match self {
            ForecastField::Condition => &entry.condition,
            ForecastField::DewpointEnglish => &entry.dewpoint.english,
            ForecastField::DewpointMetric => &entry.dewpoint.metric,
            ForecastField::FeelslikeEnglish => &entry.feelslike.english,
            ForecastField::FeelslikeMetric => &entry.feelslike.metric,
            ForecastField::ForecastTimeDate => &entry.time.pretty,
            ForecastField::HeatindexEnglish => &entry.heatindex.english,
            ForecastField::HeatindexMetric => &entry.heatindex.metric,
            ForecastField::Humidity => &entry.humidity,
            ForecastField::MeanSeaLevelPressureEnglish => &entry.mslp.english,
            ForecastField::MeanSeaLevelPressureMetric => &entry.mslp.metric,
            ForecastField::PercentCloudCover => &entry.sky,
            ForecastField::ProbabilityOfPrecipitation => &entry.pop,
            ForecastField::QuantitativePrecipitationEnglish => &entry.qpf.english,
            ForecastField::QuantitativePrecipitationMetric => &entry.qpf.metric,
            ForecastField::SnowEnglish => &entry.snow.english,
            ForecastField::SnowMetric => &entry.snow.metric,
            ForecastField::TemperatureEnglish => &entry.temp.english,
            ForecastField::TemperatureMetric => &entry.temp.metric,
            ForecastField::UltravioletIndex => &entry.uvi,
            ForecastField::WeatherCondition => &entry.wx,
            ForecastField::WindSpeedEnglish => &entry.wspd.english,
            ForecastField::WindSpeedMetric => &entry.wspd.metric,
            ForecastField::WindDirection => &entry.wdir.dir,
            ForecastField::WindDegrees => &entry.wdir.degrees,
            ForecastField::WindchillEnglish => &entry.windchill.english,
            ForecastField::WindchillMetric => &entry.windchill.metric,
        }
    }
}

/// Named presets of the forecast field table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MappingVariant {
    /// Every field in both unit systems
    #[default]
    Full,
    /// English units only, short key names
    Compact,
}

/// Which forecast fields reach the context, and under which key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    fields: Vec<(ForecastField, String)>,
}

impl FieldMapping {
    /// Build a mapping from `(field, key)` pairs
    pub fn new<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (ForecastField, K)>,
        K: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(|(f, k)| (f, k.into())).collect(),
        }
    }

    #[must_use]
    pub fn for_variant(variant: MappingVariant) -> Self {
        match variant {
            MappingVariant::Full => Self::full(),
            MappingVariant::Compact => Self::compact(),
        }
    }

    #[must_use]
    pub fn full() -> Self {
        use ForecastField::*;
        Self::new([
            (Condition, "condition"),
            (DewpointEnglish, "dewpoint_english"),
            (DewpointMetric, "dewpoint_metric"),
            (FeelslikeEnglish, "feelslike_english"),
            (FeelslikeMetric, "feelslike_metric"),
            (ForecastTimeDate, "forecast_time_date"),
            (HeatindexEnglish, "heatindex_english"),
            (HeatindexMetric, "heatindex_metric"),
            (Humidity, "humidity"),
            (MeanSeaLevelPressureEnglish, "mean_sea_level_pressure"),
            (MeanSeaLevelPressureMetric, "mean_sea_level_pressure_metric"),
            (PercentCloudCover, "percent_cloud_cover"),
            (ProbabilityOfPrecipitation, "probability_of_precipitation"),
            (QuantitativePrecipitationEnglish, "quantitative_precipitation"),
            (QuantitativePrecipitationMetric, "quantitative_precipitation_metric"),
            (SnowEnglish, "snow_english"),
            (SnowMetric, "snow_metric"),
            (TemperatureEnglish, "temperature_english"),
            (TemperatureMetric, "temperature_metric"),
            (UltravioletIndex, "ultraviolet_index"),
            (WeatherCondition, "weather_condition"),
            (WindSpeedEnglish, "wind_speed_english"),
            (WindSpeedMetric, "wind_speed_metric"),
            (WindDirection, "wind_direction"),
            (WindDegrees, "wind_degrees"),
            (WindchillEnglish, "windchill_english"),
            (WindchillMetric, "windchill_metric"),
        ])
    }

    #[must_use]
    pub fn compact() -> Self {
        use ForecastField::*;
        Self::new([
            (Condition, "condition"),
            (ForecastTimeDate, "forecast_time"),
            (Humidity, "humidity"),
            (ProbabilityOfPrecipitation, "probability_of_precipitation"),
            (TemperatureEnglish, "temperature"),
            (FeelslikeEnglish, "feels_like"),
            (WindchillEnglish, "wind_chill"),
            (WindSpeedEnglish, "wind_speed"),
            (WindDirection, "wind_direction"),
            (PercentCloudCover, "cloud_cover"),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = (ForecastField, &str)> {
        self.fields.iter().map(|(field, key)| (*field, key.as_str()))
    }

    fn apply(&self, entry: &ForecastEntry) -> Context {
        self.iter()
            .map(|(field, key)| (key.to_string(), ContextValue::from(field.extract(entry))))
            .collect()
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::full()
    }
}

/// Speed per hour of each named pace tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaceTable(BTreeMap<String, f64>);

impl PaceTable {
    pub fn new<I, K>(tiers: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self(tiers.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(tier, speed)| (tier.as_str(), *speed))
    }

    #[must_use]
    pub fn speed(&self, tier: &str) -> Option<f64> {
        self.0.get(tier).copied()
    }

    /// Context key holding the projected distance of `tier`
    #[must_use]
    pub fn distance_key(tier: &str) -> String {
        format!("{tier}_distance")
    }
}

impl Default for PaceTable {
    /// Group ride paces in miles per hour
    fn default() -> Self {
        Self::new([
            ("a_plus", 20.0),
            ("a", 18.0),
            ("b", 16.0),
            ("c", 14.0),
            ("d", 12.0),
            ("ez", 10.0),
        ])
    }
}

/// Daylight left between a target wall time and sunset, never negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct DaylightDuration {
    seconds: i64,
    past_sunset: bool,
}

impl DaylightDuration {
    /// Zero when the target is at or after sunset
    #[must_use]
    pub fn between(target: WallTime, sunset: WallTime) -> Self {
        if sunset >= target {
            Self {
                seconds: (sunset - target).num_seconds(),
                past_sunset: false,
            }
        } else {
            Self {
                seconds: 0,
                past_sunset: true,
            }
        }
    }

    #[must_use]
    pub fn seconds(self) -> i64 {
        self.seconds
    }

    #[must_use]
    pub fn minutes(self) -> f64 {
        self.seconds as f64 / 60.0
    }

    #[must_use]
    pub fn hours(self) -> f64 {
        self.seconds as f64 / 60.0 / 60.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.seconds == 0
    }

    /// The target is strictly later than sunset
    #[must_use]
    pub fn is_past_sunset(self) -> bool {
        self.past_sunset
    }
}

/// Which daylight keys the builder writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DaylightFields {
    /// `daylight_in_seconds`, `daylight_in_minutes`, `daylight_in_hours`
    #[default]
    SecondsMinutesHours,
    /// `daylight_in_minutes`, `daylight_in_hours`
    MinutesHours,
}

/// Assembles the template context for one scheduling call
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    mapping: FieldMapping,
    daylight_fields: DaylightFields,
    pace: Option<PaceTable>,
}

impl ContextBuilder {
    /// All forecast fields, daylight in seconds, minutes and hours
    #[must_use]
    pub fn full() -> Self {
        Self::default()
    }

    /// Compact forecast fields, daylight in minutes and hours, plus
    /// distance projections for every tier of `table`
    #[must_use]
    pub fn pace(table: PaceTable) -> Self {
        Self {
            mapping: FieldMapping::compact(),
            daylight_fields: DaylightFields::MinutesHours,
            pace: Some(table),
        }
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = mapping;
        self
    }

    #[must_use]
    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Build the context for `target` from the base context, the astronomy
    /// record and the matched forecast entry.
    ///
    /// Without an astronomy record the sun and daylight keys are left out.
    /// Without a forecast entry no forecast key is written.
    #[must_use]
    pub fn build(
        &self,
        base: &Context,
        target: NaiveDateTime,
        astronomy: Option<&AstronomyRecord>,
        forecast: Option<&ForecastEntry>,
    ) -> Context {
        let computed = self.computed_fields(target, astronomy);
        let forecast_fields = match forecast {
            Some(entry) => self.mapping.apply(entry),
            None => Context::new(),
        };
        debug!(
            base = base.len(),
            computed = computed.len(),
            forecast = forecast_fields.len(),
            "Merging context layers"
        );
        base.clone().merge(computed).merge(forecast_fields)
    }

    fn computed_fields(&self, target: NaiveDateTime, astronomy: Option<&AstronomyRecord>) -> Context {
        let mut context = Context::new()
            .with("event_time", format_wall_time(target.time()))
            .with("event_date", target.format("%B %d, %Y").to_string())
            .with("event_day", target.format("%A").to_string());

        let Some(record) = astronomy else {
            warn!("No astronomy data, leaving out sunset and daylight fields");
            return context;
        };
        if let Some(sunrise) = record.sunrise() {
            context = context.with("sunrise_time", format_wall_time(sunrise));
        }
        let Some(sunset) = record.sunset() else {
            warn!(?record, "Astronomy sunset is not a valid time");
            return context;
        };

        let daylight = DaylightDuration::between(target.time(), sunset);
        context = context
            .with("sunset_time", format_wall_time(sunset))
            .merge(self.daylight_values(daylight));

        if let Some(table) = &self.pace {
            context = context.merge(Self::pace_values(table, daylight));
        }
        context
    }

    fn daylight_values(&self, daylight: DaylightDuration) -> Context {
        let mut context = Context::new();
        if daylight.is_past_sunset() {
            if self.daylight_fields == DaylightFields::SecondsMinutesHours {
                context = context.with("daylight_in_seconds", 0_i64);
            }
            return context
                .with("daylight_in_minutes", 0_i64)
                .with("daylight_in_hours", 0_i64);
        }
        if self.daylight_fields == DaylightFields::SecondsMinutesHours {
            context = context.with("daylight_in_seconds", daylight.seconds() as f64);
        }
        context
            .with("daylight_in_minutes", daylight.minutes())
            .with("daylight_in_hours", daylight.hours())
    }

    fn pace_values(table: &PaceTable, daylight: DaylightDuration) -> Context {
        let mut context: Context = table
            .iter()
            .map(|(tier, speed)| (tier.to_string(), ContextValue::Number(speed)))
            .collect();
        if !daylight.is_zero() {
            for (tier, speed) in table.iter() {
                let distance = daylight.hours() * speed;
                context = context.with(PaceTable::distance_key(tier), format!("{distance:.2}"));
            }
        }
        context
    }
}
