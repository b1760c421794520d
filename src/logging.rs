//! Logging subsystem
//!
//! Structured logging via tracing with JSON (production) and plaintext
//! (development) output formats.
//!
//! # Log Targets
//!
//! Use these consistent target names across the codebase:
//! - `share` - bridge orchestration and delivery
//! - `media` - fetching, decoding, staging
//! - `caption` - compositing
//!
//! # Environment Variables
//!
//! - `FERRY_LOG` - primary log level/filter (takes precedence)
//! - `RUST_LOG` - fallback log level/filter

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::Level;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Guard to track whether logging has been initialized
static INIT_GUARD: OnceLock<()> = OnceLock::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON format for production (structured logs)
    Json,
    /// Human-readable plaintext for development
    #[default]
    Plaintext,
}

/// Log output destination
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// Write to stdout
    #[default]
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to a file at the given path
    File(PathBuf),
}

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format (JSON or plaintext)
    pub format: LogFormat,
    /// Output destination
    pub output: LogOutput,
    /// Default log level when no env filter is set
    pub default_level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Plaintext,
            output: LogOutput::Stdout,
            default_level: Level::INFO,
        }
    }
}

impl LogConfig {
    /// Development configuration (plaintext to stdout, debug level)
    pub fn development() -> Self {
        Self {
            format: LogFormat::Plaintext,
            output: LogOutput::Stdout,
            default_level: Level::DEBUG,
        }
    }

    /// Production configuration (JSON to stdout, info level)
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            default_level: Level::INFO,
        }
    }
}

/// Error type for logging initialization
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log file: {0}")]
    FileCreation(#[from] io::Error),
    #[error("failed to parse log filter: {0}")]
    FilterParse(#[from] tracing_subscriber::filter::ParseError),
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("failed to initialize subscriber: {0}")]
    TryInit(#[from] tracing_subscriber::util::TryInitError),
}

/// Build an EnvFilter from `FERRY_LOG`, then `RUST_LOG`, then the default.
fn build_env_filter(default_level: Level) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = std::env::var("FERRY_LOG") {
        return Ok(EnvFilter::try_new(filter)?);
    }
    if let Ok(filter) = std::env::var("RUST_LOG") {
        return Ok(EnvFilter::try_new(filter)?);
    }

    let default_filter = format!(
        "{level},share={level},media={level},caption={level}",
        level = default_level.as_str().to_lowercase()
    );
    Ok(EnvFilter::try_new(default_filter)?)
}

/// Initialize the logging subsystem.
///
/// Call once at application startup; subsequent calls return
/// [`LoggingError::AlreadyInitialized`].
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    if INIT_GUARD.set(()).is_err() {
        return Err(LoggingError::AlreadyInitialized);
    }
    init_logging_internal(config)
}

/// Initialize logging for tests.
///
/// Test-friendly defaults (plaintext, debug level); silently ignores errors
/// when a subscriber is already installed, so it is safe from any test.
pub fn init_test_logging() {
    let _ = init_logging_internal(LogConfig {
        format: LogFormat::Plaintext,
        output: LogOutput::Stdout,
        default_level: Level::DEBUG,
    });
}

fn init_logging_internal(config: LogConfig) -> Result<(), LoggingError> {
    let filter = build_env_filter(config.default_level)?;
    let timer = UtcTime::rfc_3339();

    let writer = match &config.output {
        LogOutput::Stdout => BoxMakeWriter::new(io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(io::stderr),
        LogOutput::File(path) => BoxMakeWriter::new(Arc::new(File::create(path)?)),
    };

    match config.format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_timer(timer)
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(writer)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
        LogFormat::Plaintext => {
            let layer = tracing_subscriber::fmt::layer()
                .with_timer(timer)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(writer)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
    }

    Ok(())
}

/// Log target constants for consistent naming across the codebase
pub mod targets {
    /// Bridge orchestration and delivery
    pub const SHARE: &str = "share";
    /// Fetching, decoding, staging
    pub const MEDIA: &str = "media";
    /// Compositing
    pub const CAPTION: &str = "caption";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    /// Serializes tests that touch process-wide env vars.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Plaintext);
        assert_eq!(config.output, LogOutput::Stdout);
        assert_eq!(config.default_level, Level::INFO);
    }

    #[test]
    fn test_log_config_development() {
        let config = LogConfig::development();
        assert_eq!(config.format, LogFormat::Plaintext);
        assert_eq!(config.default_level, Level::DEBUG);
    }

    #[test]
    fn test_log_config_production() {
        let config = LogConfig::production();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.default_level, Level::INFO);
    }

    #[test]
    fn test_env_filter_default() {
        let _lock = TEST_LOCK.lock().unwrap();
        std::env::remove_var("FERRY_LOG");
        std::env::remove_var("RUST_LOG");

        assert!(build_env_filter(Level::INFO).is_ok());
    }

    #[test]
    fn test_env_filter_ferry_log() {
        let _lock = TEST_LOCK.lock().unwrap();
        std::env::set_var("FERRY_LOG", "debug");
        assert!(build_env_filter(Level::INFO).is_ok());
        std::env::remove_var("FERRY_LOG");
    }

    #[test]
    fn test_env_filter_rust_log_fallback() {
        let _lock = TEST_LOCK.lock().unwrap();
        std::env::remove_var("FERRY_LOG");
        std::env::set_var("RUST_LOG", "warn");
        assert!(build_env_filter(Level::INFO).is_ok());
        std::env::remove_var("RUST_LOG");
    }

    #[test]
    fn test_env_filter_complex_directive() {
        let _lock = TEST_LOCK.lock().unwrap();
        std::env::set_var("FERRY_LOG", "share=debug,media=info,caption=warn");
        assert!(build_env_filter(Level::INFO).is_ok());
        std::env::remove_var("FERRY_LOG");
    }

    #[test]
    fn test_log_output_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        let config = LogConfig {
            format: LogFormat::Plaintext,
            output: LogOutput::File(path.clone()),
            default_level: Level::INFO,
        };
        assert_eq!(config.output, LogOutput::File(path));
    }

    #[test]
    fn test_targets_constants() {
        assert_eq!(targets::SHARE, "share");
        assert_eq!(targets::MEDIA, "media");
        assert_eq!(targets::CAPTION, "caption");
    }

    #[test]
    fn test_logging_error_display() {
        let err = LoggingError::AlreadyInitialized;
        assert_eq!(err.to_string(), "logging already initialized");

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = LoggingError::FileCreation(io_err);
        assert!(err.to_string().contains("failed to create log file"));
    }
}
