//! Weather Underground HTTP client
//!
//! Requests `{base_url}/{key}/{feature}/q/{location}.json` for the
//! `astronomy` and `hourly10day` features. A non-200 status, an unreadable
//! body, or a payload without the expected top-level key is a
//! [`SchedulerError::WeatherFetch`].

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::WeatherSource;
use crate::config::WeatherConfig;
use crate::models::{AstronomyRecord, HourlyForecastSeries};
use crate::{Result, SchedulerError};

const ASTRONOMY_FEATURE: &str = "astronomy";
const HOURLY_FEATURE: &str = "hourly10day";

/// Where and under which date raw feed bodies are written
#[derive(Debug, Clone)]
struct FeedDump {
    directory: PathBuf,
    date: NaiveDate,
}

/// Weather Underground API client
#[derive(Debug, Clone)]
pub struct WundergroundClient {
    client: Client,
    base_url: String,
    dump: Option<FeedDump>,
}

impl WundergroundClient {
    /// Create a new client from the weather configuration
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("weather-scheduler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SchedulerError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dump: None,
        })
    }

    /// Write every raw feed body to `directory`, named after `date`
    #[must_use]
    pub fn with_dump_directory(mut self, directory: PathBuf, date: NaiveDate) -> Self {
        self.dump = Some(FeedDump { directory, date });
        self
    }

    fn feed_url(&self, feature: &str, key: &str, location: &str) -> String {
        format!("{}/{}/{}/q/{}.json", self.base_url, key, feature, location)
    }

    #[instrument(skip(self, key))]
    async fn fetch<T: DeserializeOwned>(
        &self,
        feature: &'static str,
        required_key: &'static str,
        key: &str,
        location: &str,
    ) -> Result<T> {
        let start_time = Instant::now();
        let url = self.feed_url(feature, key, location);
        debug!("Requesting {} feed", feature);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SchedulerError::weather_fetch(feature, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SchedulerError::weather_fetch(
                feature,
                format!("The HTTP response code was not OK: {status}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SchedulerError::weather_fetch(feature, e.to_string()))?;
        self.dump_body(feature, &body).await;

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| SchedulerError::weather_fetch(feature, format!("Invalid JSON: {e}")))?;
        if value.get(required_key).is_none() {
            return Err(SchedulerError::weather_fetch(
                feature,
                format!("The {feature} data does not contain {required_key}"),
            ));
        }

        let parsed = serde_json::from_value(value)
            .map_err(|e| SchedulerError::weather_fetch(feature, format!("Unexpected data: {e}")))?;

        info!(
            "Retrieved {} feed in {:.3}s",
            feature,
            start_time.elapsed().as_secs_f64()
        );
        Ok(parsed)
    }

    async fn dump_body(&self, feature: &str, body: &str) {
        let Some(dump) = &self.dump else {
            return;
        };
        let path = dump
            .directory
            .join(format!("{}-{}.json", dump.date.format("%Y-%m-%d"), feature));
        match tokio::fs::write(&path, body).await {
            Ok(()) => info!("Wrote {}", path.display()),
            Err(e) => warn!("Unable to write {}: {}", path.display(), e),
        }
    }
}

#[async_trait]
impl WeatherSource for WundergroundClient {
    async fn astronomy(&self, key: &str, location: &str) -> Result<AstronomyRecord> {
        self.fetch(ASTRONOMY_FEATURE, AstronomyRecord::REQUIRED_KEY, key, location)
            .await
    }

    async fn hourly_forecast(&self, key: &str, location: &str) -> Result<HourlyForecastSeries> {
        self.fetch(HOURLY_FEATURE, HourlyForecastSeries::REQUIRED_KEY, key, location)
            .await
    }
}
