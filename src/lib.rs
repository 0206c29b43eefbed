//! `weather-scheduler` - Render event announcements from weather forecasts
//!
//! Resolves the next occurrence of a weekday and wall time, fetches the
//! astronomy and hourly forecast feeds for a location, and renders the
//! day's template with the forecast for that hour. An email transport sends
//! the result.

pub mod cli;
pub mod config;
pub mod context;
pub mod email;
pub mod error;
pub mod kv;
pub mod logging;
pub mod matcher;
pub mod models;
pub mod scheduler;
pub mod template;
pub mod weather;
pub mod weekday;

// Re-export core types for public API
pub use config::SchedulerConfig;
pub use context::{Context, ContextBuilder, ContextValue, FieldMapping, MappingVariant, PaceTable};
pub use error::SchedulerError;
pub use matcher::match_forecast;
pub use models::{AstronomyRecord, ForecastEntry, HourlyForecastSeries};
pub use scheduler::{ScheduleRequest, Scheduler};
pub use template::{FileTemplateStore, JinjaRenderer, TemplateRenderer, TemplateStore};
pub use weather::{WeatherSource, WundergroundClient};
pub use weekday::{WallTime, resolve_target};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SchedulerError>;
