//! Structured logging setup for buildmatrix
//!
//! Log lines always go to stderr; stdout carries only the build plan so it
//! can be piped straight into a CI matrix.
//!
//! Level precedence: `--log-level`, then `-v`/`-q`, then
//! `BUILDMATRIX_LOG_LEVEL`, then INFO. When `RUST_LOG` is set it replaces
//! the computed directives entirely. `BUILDMATRIX_LOG_JSON=true` switches to
//! JSON lines.

use crate::config::env_var;
use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Crates whose debug output drowns out ours
const NOISY_CRATES: [&str; 3] = ["h2", "hyper", "reqwest"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., buildmatrix::matrix::engine) in logs
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Combine command-line flags with `BUILDMATRIX_LOG_*` variables
    pub fn resolve(log_level: Option<&str>, verbose: bool, quiet: bool) -> Self {
        let level = if let Some(level_str) = log_level {
            parse_level(level_str)
        } else if verbose {
            Level::DEBUG
        } else if quiet {
            Level::ERROR
        } else {
            let level_str = env_var("BUILDMATRIX_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
            parse_level(&level_str)
        };

        let use_json = env_var("BUILDMATRIX_LOG_JSON")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            ..Default::default()
        }
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn filter(&self) -> EnvFilter {
        let own = format!("buildmatrix={}", self.level.to_string().to_lowercase());
        let directives = std::iter::once(own)
            .chain(NOISY_CRATES.iter().map(|krate| format!("{}=warn", krate)));

        directives
            .filter_map(|d| d.parse::<Directive>().ok())
            .fold(EnvFilter::new("warn"), |filter, d| filter.add_directive(d))
    }
}

/// Parses a log level from a string, defaulting to INFO
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Installs the global subscriber; later calls are no-ops
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = if env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            config.filter()
        };

        let layer = fmt::layer()
            .with_target(config.include_target)
            .with_writer(std::io::stderr);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("Info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    #[serial]
    fn test_resolve_precedence() {
        env::set_var("BUILDMATRIX_LOG_LEVEL", "warn");

        assert_eq!(LoggingConfig::resolve(Some("trace"), true, false).level, Level::TRACE);
        assert_eq!(LoggingConfig::resolve(None, true, false).level, Level::DEBUG);
        assert_eq!(LoggingConfig::resolve(None, false, true).level, Level::ERROR);
        assert_eq!(LoggingConfig::resolve(None, false, false).level, Level::WARN);

        env::remove_var("BUILDMATRIX_LOG_LEVEL");
        assert_eq!(LoggingConfig::resolve(None, false, false).level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_resolve_empty_level_is_unset() {
        env::set_var("BUILDMATRIX_LOG_LEVEL", "");
        assert_eq!(LoggingConfig::resolve(None, false, false).level, Level::INFO);

        env::set_var("BUILDMATRIX_LOG_JSON", "");
        assert!(!LoggingConfig::resolve(None, false, false).use_json);

        env::remove_var("BUILDMATRIX_LOG_LEVEL");
        env::remove_var("BUILDMATRIX_LOG_JSON");
    }

    #[test]
    #[serial]
    fn test_resolve_json_flag() {
        env::set_var("BUILDMATRIX_LOG_JSON", "true");
        assert!(LoggingConfig::resolve(None, false, false).use_json);

        env::set_var("BUILDMATRIX_LOG_JSON", "nope");
        assert!(!LoggingConfig::resolve(None, false, false).use_json);

        env::remove_var("BUILDMATRIX_LOG_JSON");
    }

    #[test]
    fn test_filter_caps_http_crates() {
        let filter = LoggingConfig::with_level(Level::DEBUG)
            .filter()
            .to_string()
            .to_lowercase();
        assert!(filter.contains("buildmatrix=debug"));
        assert!(filter.contains("reqwest=warn"));
        assert!(filter.contains("hyper=warn"));
    }
}
