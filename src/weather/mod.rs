//! Weather feed retrieval
//!
//! The scheduler needs two independent feeds for a location: the astronomy
//! feed (sunrise/sunset) and the ten day hourly forecast. [`fetch_feeds`]
//! requests both concurrently and recovers from each failure separately, so
//! one feed failing never keeps the other's data out of the context.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::Result;
use crate::models::{AstronomyRecord, HourlyForecastSeries};

pub mod wunderground;

pub use wunderground::WundergroundClient;

/// Source of the two weather feeds
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Sunrise and sunset for `location`
    async fn astronomy(&self, key: &str, location: &str) -> Result<AstronomyRecord>;

    /// Hourly forecast series for `location`
    async fn hourly_forecast(&self, key: &str, location: &str) -> Result<HourlyForecastSeries>;
}

/// Data of both feeds; a feed that failed is `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherFeeds {
    pub astronomy: Option<AstronomyRecord>,
    pub hourly: Option<HourlyForecastSeries>,
}

/// Fetch both feeds concurrently, logging and dropping any failure
#[tracing::instrument(skip(source, key))]
pub async fn fetch_feeds(source: &dyn WeatherSource, key: &str, location: &str) -> WeatherFeeds {
    let (astronomy, hourly) = futures::join!(
        source.astronomy(key, location),
        source.hourly_forecast(key, location)
    );

    let astronomy = astronomy
        .inspect_err(|e| warn!("An error occurred getting astronomy data: {}", e))
        .ok();
    let hourly = hourly
        .inspect_err(|e| warn!("An error occurred getting the hourly forecast data: {}", e))
        .ok();

    info!(
        astronomy = astronomy.is_some(),
        hourly_entries = hourly.as_ref().map_or(0, |h| h.hourly_forecast.len()),
        "Weather feeds retrieved"
    );
    WeatherFeeds { astronomy, hourly }
}
