//! Centralized logging configuration for all Bizlink binaries
//!
//! Provides consistent logging setup with support for:
//! - Text, JSON, and pretty-printed output
//! - Environment variable configuration
//! - Per-module log level filtering
//!
//! # Examples
//!
//! ```no_run
//! use libbizlink::logging::{LoggingConfig, LogFormat};
//!
//! let config = LoggingConfig::new(LogFormat::Json, "info".to_string(), false);
//! config.init();
//! ```

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text output (no colors, for piping)
    Text,
    /// Machine-parseable JSON (one JSON object per line)
    Json,
    /// Pretty-printed with colors (for development)
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

const QUIET_TARGETS: [&str; 4] = ["sqlx", "hyper", "hyper_util", "reqwest"];

/// Configuration for logging initialization
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    /// `verbose` raises the level to debug regardless of `level`
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Build from `BIZLINK_LOG_FORMAT` / `BIZLINK_LOG_LEVEL`, with the
    /// binary's `--verbose` flag layered on top
    pub fn from_env(verbose: bool) -> Self {
        let format = std::env::var("BIZLINK_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogFormat::Text);

        let level = std::env::var("BIZLINK_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());

        Self::new(format, level, verbose)
    }

    /// Level directive for our own crates; SQL and HTTP internals stay at
    /// warn so `--verbose` shows requests, not connection pool chatter
    fn filter_directive(&self) -> String {
        let level = if self.verbose { "debug" } else { self.level.as_str() };

        QUIET_TARGETS
            .iter()
            .fold(level.to_string(), |directive, target| {
                format!("{},{}=warn", directive, target)
            })
    }

    /// Initialize logging with the configured settings
    ///
    /// This should be called once at the start of your program. Calling it
    /// again is a no-op.
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.filter_directive()));
        let directive = filter.to_string();

        // try_init: a second subscriber (tests, embedding) is not fatal
        let _ = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .flatten_event(true)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .try_init(),
        };

        tracing::debug!(format = %self.format, filter = %directive, "Logging initialized");
    }
}

/// Initialize logging with default settings
///
/// Respects `BIZLINK_LOG_FORMAT` and `BIZLINK_LOG_LEVEL` environment variables.
/// Falls back to text format with warn level if not set.
pub fn init_default() {
    LoggingConfig::from_env(false).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);

        // Case insensitive
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("Json".parse::<LogFormat>().unwrap(), LogFormat::Json);
    }

    #[test]
    fn test_log_format_from_str_invalid() {
        let result = "xml".parse::<LogFormat>();
        assert!(result.unwrap_err().contains("Invalid log format: 'xml'"));
    }

    #[test]
    fn test_log_format_display() {
        assert_eq!(LogFormat::Text.to_string(), "text");
        assert_eq!(LogFormat::Json.to_string(), "json");
        assert_eq!(LogFormat::Pretty.to_string(), "pretty");
    }

    #[test]
    fn test_verbose_overrides_level() {
        let config = LoggingConfig::new(LogFormat::Text, "error".to_string(), true);
        assert!(config.filter_directive().starts_with("debug,"));

        let quiet = LoggingConfig::new(LogFormat::Text, "error".to_string(), false);
        assert!(quiet.filter_directive().starts_with("error,"));
    }

    #[test]
    fn test_dependency_targets_stay_quiet() {
        let config = LoggingConfig::new(LogFormat::Json, "trace".to_string(), false);
        let directive = config.filter_directive();

        assert!(directive.contains("sqlx=warn"));
        assert!(directive.contains("reqwest=warn"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("BIZLINK_LOG_FORMAT", "json");
        std::env::set_var("BIZLINK_LOG_LEVEL", "trace");
        let config = LoggingConfig::from_env(false);
        std::env::remove_var("BIZLINK_LOG_FORMAT");
        std::env::remove_var("BIZLINK_LOG_LEVEL");

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "trace");
        assert!(!config.verbose);
    }
}
