//! Configuration management for the weather scheduler
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and validates the result. Every section has defaults so an empty or
//! missing file is a valid configuration.

use crate::SchedulerError;
use crate::context::{ContextBuilder, FieldMapping, ForecastField, MappingVariant, PaceTable};
use crate::weekday::{parse_wall_time, weekday_index};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Environment variable prefix, e.g. `WEATHER_SCHEDULER_WEATHER__API_KEY`
pub const ENV_PREFIX: &str = "WEATHER_SCHEDULER";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Template store configuration
    #[serde(default)]
    pub templates: TemplateConfig,
    /// Default values for the scheduling inputs
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Context builder configuration
    #[serde(default)]
    pub context: ContextConfig,
    /// SMTP configuration
    #[serde(default)]
    pub email: EmailConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Weather Underground API key
    pub api_key: Option<String>,
    /// Base URL for the weather API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Directory that receives the raw feed bodies, when set
    pub dump_directory: Option<PathBuf>,
}

/// Template store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory holding one template file per weekday name
    pub directory: PathBuf,
}

/// Default scheduling inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub day: String,
    pub location: String,
    /// Event time in "HH:MM AM|PM" form
    pub time: String,
}

/// Context builder settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Preset forecast field table
    pub variant: MappingVariant,
    /// Explicit field to key table, replaces the preset when non-empty
    pub field_names: BTreeMap<ForecastField, String>,
    /// Add pace tier distance projections
    pub pace_projection: bool,
    /// Pace tiers, replaces the default table when non-empty
    pub pace_table: BTreeMap<String, f64>,
}

/// SMTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    /// Only read from file or environment, never from the command line
    pub password: Option<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "http://api.wunderground.com/api".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_template_directory() -> PathBuf {
    PathBuf::from("templates")
}

fn default_day() -> String {
    "monday".to_string()
}

fn default_location() -> String {
    "MN/Rochester".to_string()
}

fn default_time() -> String {
    "6:00 PM".to_string()
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            dump_directory: None,
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            directory: default_template_directory(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            day: default_day(),
            location: default_location(),
            time: default_time(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: default_smtp_port(),
            username: None,
            password: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ContextConfig {
    /// Context builder described by this section
    #[must_use]
    pub fn builder(&self) -> ContextBuilder {
        let mut builder = if self.pace_projection {
            let table = if self.pace_table.is_empty() {
                PaceTable::default()
            } else {
                PaceTable::new(self.pace_table.clone())
            };
            ContextBuilder::pace(table).with_mapping(FieldMapping::for_variant(self.variant))
        } else {
            ContextBuilder::full().with_mapping(FieldMapping::for_variant(self.variant))
        };
        if !self.field_names.is_empty() {
            builder = builder.with_mapping(FieldMapping::new(self.field_names.clone()));
        }
        builder
    }
}

impl SchedulerConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SchedulerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weather-scheduler").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.api_key.as_deref().is_some_and(str::is_empty) {
            self.weather.api_key = None;
        }
        if self.templates.directory.as_os_str().is_empty() {
            self.templates.directory = default_template_directory();
        }
        if self.defaults.day.is_empty() {
            self.defaults.day = default_day();
        }
        if self.defaults.location.is_empty() {
            self.defaults.location = default_location();
        }
        if self.defaults.time.is_empty() {
            self.defaults.time = default_time();
        }
        if self.email.server.is_empty() {
            self.email.server = default_smtp_server();
        }
        if self.email.port == 0 {
            self.email.port = default_smtp_port();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> std::result::Result<(), SchedulerError> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_defaults()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> std::result::Result<(), SchedulerError> {
        if self.weather.timeout_seconds > 300 {
            return Err(SchedulerError::config(
                "Weather API timeout cannot exceed 300 seconds",
            ));
        }

        if self.email.port == 0 {
            return Err(SchedulerError::config("SMTP port cannot be 0"));
        }

        if let Some((tier, speed)) = self
            .context
            .pace_table
            .iter()
            .find(|(_, speed)| !speed.is_finite() || **speed <= 0.0)
        {
            return Err(SchedulerError::config(format!(
                "Pace for tier '{tier}' must be a positive number, got {speed}"
            )));
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> std::result::Result<(), SchedulerError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SchedulerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SchedulerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(SchedulerError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            ));
        }

        Ok(())
    }

    /// Validate that the default day and time would be accepted as input
    fn validate_defaults(&self) -> std::result::Result<(), SchedulerError> {
        weekday_index(&self.defaults.day).map_err(|e| {
            SchedulerError::config(format!("Invalid default day: {e}"))
        })?;
        parse_wall_time(&self.defaults.time).map_err(|e| {
            SchedulerError::config(format!("Invalid default time: {e}"))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextValue;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.weather.base_url, "http://api.wunderground.com/api");
        assert_eq!(config.weather.timeout_seconds, 30);
        assert_eq!(config.templates.directory, PathBuf::from("templates"));
        assert_eq!(config.defaults.day, "monday");
        assert_eq!(config.defaults.location, "MN/Rochester");
        assert_eq!(config.defaults.time, "6:00 PM");
        assert_eq!(config.email.server, "smtp.gmail.com");
        assert_eq!(config.email.port, 587);
        assert_eq!(config.logging.level, "info");
        assert!(config.weather.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = SchedulerConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = SchedulerConfig::default();
        config.weather.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_bad_default_day() {
        let mut config = SchedulerConfig::default();
        config.defaults.day = "caturday".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("default day"));
    }

    #[test]
    fn test_config_validation_negative_pace() {
        let mut config = SchedulerConfig::default();
        config.context.pace_table.insert("a".to_string(), -1.0);
        assert!(config.validate().unwrap_err().to_string().contains("tier 'a'"));
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = SchedulerConfig::default();
        config.weather.base_url.clear();
        config.weather.api_key = Some(String::new());
        config.email.port = 0;
        config.apply_defaults();
        assert_eq!(config.weather.base_url, "http://api.wunderground.com/api");
        assert!(config.weather.api_key.is_none());
        assert_eq!(config.email.port, 587);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[weather]
api_key = "abcdef123456"

[defaults]
day = "wednesday"
time = "5:30 PM"

[context]
pace_projection = true

[context.pace_table]
fast = 20.0
"#
        )
        .unwrap();

        let config = SchedulerConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.weather.api_key.as_deref(), Some("abcdef123456"));
        assert_eq!(config.defaults.day, "wednesday");
        assert_eq!(config.defaults.location, "MN/Rochester");
        assert!(config.context.pace_projection);
        assert_eq!(config.context.pace_table.get("fast"), Some(&20.0));
    }

    #[test]
    fn test_context_builder_from_field_names() {
        let mut context = ContextConfig::default();
        context
            .field_names
            .insert(ForecastField::TemperatureMetric, "celsius".to_string());
        let built = context.builder().build(
            &crate::Context::new(),
            NaiveDate::from_ymd_opt(2017, 3, 22).unwrap().and_hms_opt(19, 0, 0).unwrap(),
            None,
            None,
        );
        assert!(context.builder().mapping().iter().any(|(_, key)| key == "celsius"));
        assert_eq!(built.get("event_day"), Some(&ContextValue::from("Wednesday")));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = SchedulerConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("weather-scheduler"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
