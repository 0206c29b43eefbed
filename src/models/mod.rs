//! Data models for the weather feeds
//!
//! This module contains the feed records organized by concern:
//! - Astronomy: sunrise and sunset wall times for a location and day
//! - Forecast: the hourly forecast series and its entries
//!
//! Both feeds encode numbers as JSON strings, so the helpers in [`de`]
//! accept either representation.

pub mod astronomy;
pub mod forecast;

// Re-export all public types for convenient access
pub use astronomy::{AstronomyRecord, HourMinute, SunPhase};
pub use forecast::{ForecastEntry, ForecastTime, HourlyForecastSeries, UnitPair, WindDirection};

/// Lenient deserializers for string-or-number feed values
///
/// A `null` value reads as empty text (or the type's default) so a single
/// missing reading never rejects the record holding it.
pub(crate) mod de {
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer};
    use std::fmt::Display;
    use std::str::FromStr;
    use tracing::warn;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    impl Raw {
        fn into_text(self) -> String {
            match self {
                Raw::Text(text) => text,
                Raw::Integer(value) => value.to_string(),
                Raw::Float(value) => value.to_string(),
            }
        }
    }

    /// Parse a number that may be quoted, e.g. `"19"` or `19`
    pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let text = Raw::deserialize(deserializer)?.into_text();
        text.trim().parse::<T>().map_err(D::Error::custom)
    }

    /// Like [`number`], with `null` read as the type's default
    pub fn number_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + Default,
        T::Err: Display,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            Some(raw) => raw.into_text().trim().parse::<T>().map_err(D::Error::custom),
            None => Ok(T::default()),
        }
    }

    /// Keep a value as text whether it was quoted or not; `null` is empty
    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Raw>::deserialize(deserializer)?
            .map(Raw::into_text)
            .unwrap_or_default())
    }

    /// Nested record that reads `null` as its default
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Deserialize a list, dropping (and logging) elements that do not fit `T`
    pub fn skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
        Ok(values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                serde_json::from_value(value)
                    .inspect_err(|e| warn!(index, "Dropping unreadable feed entry: {}", e))
                    .ok()
            })
            .collect())
    }
}
