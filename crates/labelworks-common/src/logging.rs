//! Logging initialization
//!
//! Library crates only emit `tracing` events. Binaries and test harnesses call
//! [`init_logging`] once to install a formatting subscriber on stderr.

use serde::{Deserialize, Serialize};
use tracing::Level;

/// Minimum log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn as_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// Logging configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum log level
    pub level: LogLevel,
    /// Include the event target (module path) in output
    pub with_target: bool,
    /// Colorize output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_target: true,
            ansi: false,
        }
    }
}

impl LoggingConfig {
    /// Build a config from the `LABELWORKS_LOG` environment variable, falling
    /// back to defaults when unset or unparseable.
    pub fn from_env() -> Self {
        let level = std::env::var("LABELWORKS_LOG")
            .ok()
            .and_then(|value| LogLevel::parse(&value))
            .unwrap_or_default();
        Self {
            level,
            ..Self::default()
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// Returns `false` when a global subscriber was already installed, which is
/// expected when several tests initialize logging.
pub fn init_logging(config: &LoggingConfig) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(config.level.as_tracing_level())
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
