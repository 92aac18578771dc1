//! Log setup for the two processes: the trigger service writes to the
//! operator's console, the crawl child writes the run log.

use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Where this process's log lines end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    /// Interactive console of the trigger service or a one-off command.
    Console,
    /// Stdout of the crawl child, redirected into the run log file. Plain
    /// timestamped lines without targets or color codes.
    RunLog,
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{value}': {source}")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("could not install log subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// `RUST_LOG`, when set, replaces the configured level.
fn log_filter(rust_log: Option<&str>, configured: &str) -> Result<EnvFilter, TelemetryError> {
    let value = rust_log
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(configured);
    EnvFilter::try_new(value).map_err(|source| TelemetryError::Filter {
        value: value.to_string(),
        source,
    })
}

/// Install the global subscriber for `sink`. Fails if one is already set.
pub fn init(config: &TelemetryConfig, sink: LogSink) -> Result<(), TelemetryError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(rust_log.as_deref(), &config.log_level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match sink {
        LogSink::Console => builder.compact().with_target(true).with_ansi(true).try_init(),
        LogSink::RunLog => builder.with_target(false).with_ansi(false).try_init(),
    };
    installed.map_err(TelemetryError::Install)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_applies_without_rust_log() {
        let filter = log_filter(None, "staff_directory=debug").expect("valid filter");
        assert_eq!(filter.to_string(), "staff_directory=debug");
    }

    #[test]
    fn rust_log_overrides_configured_level() {
        let filter = log_filter(Some("warn"), "info").expect("valid filter");
        assert_eq!(filter.to_string(), "warn");

        let blank = log_filter(Some("  "), "info").expect("falls back");
        assert_eq!(blank.to_string(), "info");
    }

    #[test]
    fn invalid_filter_is_reported_with_its_value() {
        let error = log_filter(None, "staff_directory=loud").expect_err("filter is invalid");
        assert!(matches!(error, TelemetryError::Filter { ref value, .. } if value == "staff_directory=loud"));
        assert!(error.to_string().contains("staff_directory=loud"));
    }
}
