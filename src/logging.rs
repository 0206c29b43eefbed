//! Tracing subscriber setup
//!
//! Logs go to stderr so rendered text on stdout stays clean for piping.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Filter directive used for the session.
///
/// `verbose` forces `debug`; otherwise `RUST_LOG` wins over the configured level.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        return "debug".to_string();
    }
    std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.level.clone())
}

/// Install the global subscriber. Repeated calls are no-ops.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_new(filter_directive(config, verbose))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if config.format == "json" {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(format = %config.format, "Logging initialized");
    }
}
