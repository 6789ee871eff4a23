//! Logging bootstrap for the Natours server.
//!
//! The server logs through `tracing`; this crate owns the subscriber setup so
//! the binary and any tooling share one configuration surface:
//!
//! - `NATOURS_LOG_LEVEL` (falls back to `RUST_LOG`)
//! - `NATOURS_LOG_FORMAT` = `pretty` | `compact` | `json`
//! - `NATOURS_LOG_SOURCE` = `true` | `1` to include file and line

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Include source location.
    pub source_location: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON structured format.
    Json,
}

impl LogFormat {
    /// Parse from string, defaulting to pretty.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            source_location: false,
        }
    }
}

impl LogConfig {
    /// Defaults for a runtime mode: development logs verbosely in pretty
    /// form, production logs `info` as JSON.
    pub fn for_mode(development: bool) -> Self {
        if development {
            Self {
                level: LogLevel::Debug,
                format: LogFormat::Pretty,
                source_location: true,
            }
        } else {
            Self {
                level: LogLevel::Info,
                format: LogFormat::Json,
                source_location: false,
            }
        }
    }

    /// Overlay environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        let level = std::env::var("NATOURS_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok());
        if let Some(level) = level.as_deref().and_then(LogLevel::parse) {
            self.level = level;
        }

        if let Ok(format) = std::env::var("NATOURS_LOG_FORMAT") {
            self.format = LogFormat::parse(&format);
        }

        if let Ok(source) = std::env::var("NATOURS_LOG_SOURCE") {
            self.source_location = source.eq_ignore_ascii_case("true") || source == "1";
        }

        self
    }

    /// Create config from environment variables only.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` directives, when present, win over `config.level` so per-target
/// filters like `natours_server=debug,tower_http=info` keep working.
pub fn init(config: LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_ansi(true).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| LogError::InitError(e.to_string()))
}

/// Logging errors.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to initialize logging: {0}")]
    InitError(String),
}
