//! Error types and handling for the weather scheduler
//!
//! Errors in required inputs (day name, time, key=value syntax, template
//! existence) abort the operation. Errors local to an optional data source
//! (a weather feed, a forecast match) are recovered by the orchestrator.

use thiserror::Error;

/// Exit code for command-line arguments the parser rejected
pub const USAGE_EXIT_CODE: u8 = 8;

/// Main error type for the weather scheduler
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The weekday name is not one of the seven English day names
    #[error("Invalid weekday: '{0}'. Valid days: monday|tuesday|wednesday|thursday|friday|saturday|sunday")]
    InvalidWeekday(String),

    /// The wall time could not be parsed as "HH:MM AM|PM"
    #[error("Invalid time: '{0}'. Expected \"HH:MM AM|PM\"")]
    InvalidTime(String),

    /// A context segment did not contain exactly one '='
    #[error("Malformed key=value pair: '{0}'")]
    MalformedPair(String),

    /// No template exists for the requested day
    #[error("Template not found for '{day}' at {path}")]
    TemplateNotFound { day: String, path: String },

    /// The template could not be compiled or rendered
    #[error("Template error: {message}")]
    Template { message: String },

    /// A weather feed could not be fetched or was missing its data
    #[error("Weather fetch error ({feed}): {message}")]
    WeatherFetch { feed: &'static str, message: String },

    /// No hourly forecast entry matched the target day and hour
    #[error("No forecast entry for day {day} hour {hour}")]
    ForecastNotMatched { day: u32, hour: u32 },

    /// The SMTP server rejected the credentials
    #[error("SMTP authentication failed: {message}")]
    SmtpAuth { message: String },

    /// The SMTP exchange failed for any other reason
    #[error("SMTP send failed: {message}")]
    SmtpSend { message: String },

    /// The email message could not be assembled
    #[error("Email error: {message}")]
    Email { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The user quit an interactive prompt
    #[error("Cancelled by user")]
    Cancelled,

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SchedulerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(message: S) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create a new weather fetch error for the named feed
    pub fn weather_fetch<S: Into<String>>(feed: &'static str, message: S) -> Self {
        Self::WeatherFetch {
            feed,
            message: message.into(),
        }
    }

    /// Create a new email construction error
    pub fn email<S: Into<String>>(message: S) -> Self {
        Self::Email {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SchedulerError::InvalidWeekday(_)
            | SchedulerError::InvalidTime(_)
            | SchedulerError::MalformedPair(_) => format!("Invalid input: {self}"),
            SchedulerError::TemplateNotFound { day, .. } => {
                format!("No template for '{day}'. Create one in the templates directory.")
            }
            SchedulerError::Template { message } => format!("Unable to render template: {message}"),
            SchedulerError::WeatherFetch { .. } => {
                "Unable to retrieve weather data. Please check your key and internet connection."
                    .to_string()
            }
            SchedulerError::ForecastNotMatched { .. } => {
                "The forecast does not cover the requested day and time.".to_string()
            }
            SchedulerError::SmtpAuth { .. } => {
                "Unable to authenticate and send message.".to_string()
            }
            SchedulerError::SmtpSend { .. } => "Unable to send the message.".to_string(),
            SchedulerError::Email { message } => format!("Unable to build the message: {message}"),
            SchedulerError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and environment.")
            }
            SchedulerError::Cancelled => "User has quit, exiting program.".to_string(),
            SchedulerError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }

    /// Process exit code for this failure category
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            SchedulerError::Config { .. } | SchedulerError::Io { .. } => 1,
            SchedulerError::Cancelled => 2,
            SchedulerError::InvalidWeekday(_)
            | SchedulerError::InvalidTime(_)
            | SchedulerError::MalformedPair(_) => 3,
            SchedulerError::TemplateNotFound { .. } | SchedulerError::Template { .. } => 4,
            SchedulerError::SmtpAuth { .. } => 5,
            SchedulerError::SmtpSend { .. } | SchedulerError::Email { .. } => 6,
            SchedulerError::WeatherFetch { .. } | SchedulerError::ForecastNotMatched { .. } => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_error_creation() {
        let config_err = SchedulerError::config("missing key");
        assert!(matches!(config_err, SchedulerError::Config { .. }));

        let fetch_err = SchedulerError::weather_fetch("astronomy", "HTTP 500");
        assert!(matches!(
            fetch_err,
            SchedulerError::WeatherFetch {
                feed: "astronomy",
                ..
            }
        ));
        assert!(fetch_err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_user_messages() {
        let err = SchedulerError::InvalidWeekday("funday".to_string());
        assert!(err.user_message().contains("funday"));

        let err = SchedulerError::SmtpAuth {
            message: "535".to_string(),
        };
        assert!(err.user_message().contains("authenticate"));

        assert!(SchedulerError::Cancelled.user_message().contains("User has quit"));

        let err = SchedulerError::config("No weather API key");
        assert!(err.user_message().contains("No weather API key"));
    }

    #[rstest]
    #[case(SchedulerError::config("x"), 1)]
    #[case(SchedulerError::Cancelled, 2)]
    #[case(SchedulerError::MalformedPair("a=1=2".into()), 3)]
    #[case(SchedulerError::TemplateNotFound { day: "monday".into(), path: "templates/monday".into() }, 4)]
    #[case(SchedulerError::SmtpAuth { message: "denied".into() }, 5)]
    #[case(SchedulerError::SmtpSend { message: "reset".into() }, 6)]
    #[case(SchedulerError::weather_fetch("hourly10day", "timeout"), 7)]
    fn test_exit_codes_are_distinct_per_category(#[case] err: SchedulerError, #[case] code: u8) {
        assert_eq!(err.exit_code(), code);
        assert_ne!(err.exit_code(), USAGE_EXIT_CODE);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SchedulerError = io_err.into();
        assert!(matches!(err, SchedulerError::Io { .. }));
    }
}
