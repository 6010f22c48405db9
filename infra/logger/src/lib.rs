//! # Logger
//!
//! Installs the global `tracing` subscriber used by enhancer hosts.
//!
//! Every enhancer crate reports through `tracing`: attachment and exchange
//! lifecycles at `debug`, bus traffic at `trace`, failed exchanges at `warn`
//! and `error`. This crate decides where those events go:
//!
//! * a console layer (compact and coloured, or JSON lines for log shippers);
//! * an optional capture directory with daily files, handy for headless test hosts;
//! * a level plus an optional module filter (e.g., `"ln_ajax=debug,ln_dom=info"`),
//!   which `RUST_LOG` overrides.
//!
//! ## Example
//!
//! ```rust
//! # use ln_logger::{Logger, LevelFilter};
//!
//! let _logger = Logger::builder()
//!     .name("page-host")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;

use private::Sealed;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 7;
const CAPTURE_FILE_SUFFIX: &str = "log";

/// Output encoding shared by the console and capture layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Human-readable single-line events.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

#[derive(Debug)]
struct LoggerConfig {
    console: bool,
    format: Format,
    level: LevelFilter,
    env_filter: Option<String>,
    capture_dir: Option<PathBuf>,
    max_files: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            format: Format::Compact,
            level: LevelFilter::INFO,
            env_filter: None,
            capture_dir: None,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}

/// A builder for the global diagnostics subscriber.
///
/// A name is mandatory: it tags capture files and keeps hosts distinguishable
/// when several write to the same directory.
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName> {
    config: LoggerConfig,
    name: N,
}

impl LoggerBuilder<NoName> {
    /// Sets the name of the logger.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName> {
        LoggerBuilder { name: WithName(name.into()), config: self.config }
    }
}

impl LoggerBuilder<WithName> {
    /// Configures the minimum level emitted when no filter overrides it.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Adds an explicit filter directive (e.g., `ln_ajax=debug,ln_dom=warn`).
    ///
    /// `RUST_LOG` still wins; this is the programmatic default.
    /// Invalid directives make [`LoggerBuilder::init`] fail.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    /// Enables or disables the console layer.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Switches every layer to JSON lines.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(mut self) -> Self {
        self.config.format = Format::Json;
        self
    }

    /// Also writes events to daily files under `dir`, keeping at most `max_files`.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn capture(mut self, dir: impl Into<PathBuf>, max_files: usize) -> Self {
        self.config.capture_dir = Some(dir.into());
        self.config.max_files = max_files;
        self
    }

    /// Consumes the builder and installs the global tracing subscriber.
    ///
    /// The returned [`Logger`] owns the capture writer; keep it alive for as long
    /// as events should be flushed to disk.
    ///
    /// # Errors
    /// Returns [`LoggerError::Subscriber`] if a global subscriber is already set, and
    /// [`LoggerError::InvalidConfiguration`] when no output is enabled, the name is
    /// blank, or the filter directive does not parse.
    pub fn init(self) -> Result<Logger, LoggerError> {
        validate_config(&self.config, &self.name.0)?;
        let env_filter = build_env_filter(&self.config)?;
        let json = self.config.format == Format::Json;

        let mut layers = Vec::new();
        if self.config.console {
            let console = layer().with_ansi(!json);
            layers.push(if json { console.json().boxed() } else { console.compact().boxed() });
        }

        let guard = match self.config.capture_dir {
            Some(dir) => {
                fs::create_dir_all(&dir).map_err(|e| LoggerError::Internal {
                    message: e.to_string().into(),
                    context: Some(format!("Failed to create path: {}", dir.display()).into()),
                })?;

                let appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .filename_prefix(&self.name.0)
                    .filename_suffix(CAPTURE_FILE_SUFFIX)
                    .max_log_files(self.config.max_files)
                    .build(&dir)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let capture = layer().with_writer(writer).with_ansi(false);
                layers.push(if json { capture.json().boxed() } else { capture.boxed() });
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;
        tracing::debug!(name = %self.name.0, ?json, "Diagnostics subscriber installed");

        Ok(Logger { guard })
    }
}

/// A handle to the installed diagnostics subscriber.
#[must_use = "Dropping this handle stops the capture writer."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Returns a new [`LoggerBuilder`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use ln_logger::{LevelFilter, Logger};
    ///
    /// let _logger = Logger::builder()
    ///     .name("page-host")
    ///     .level(LevelFilter::DEBUG)
    ///     .init()
    ///     .unwrap();
    /// ```
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { config: LoggerConfig::default(), name: NoName }
    }

    /// Whether events are also captured to files.
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.guard.is_some()
    }
}

fn validate_config(config: &LoggerConfig, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }
    if !config.console && config.capture_dir.is_none() {
        return Err(LoggerError::InvalidConfiguration {
            message: "No logging layers enabled. Enable console or capture output.".into(),
            context: None,
        });
    }
    if config.capture_dir.is_some() && config.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }
    Ok(())
}

fn build_env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(config.level.into());
    match config.env_filter.as_ref() {
        None => Ok(builder.from_env_lossy()),
        Some(filter) => builder.parse(filter).map_err(|e| LoggerError::InvalidConfiguration {
            message: format!("Invalid env filter '{filter}': {e}").into(),
            context: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_builder_defaults() {
        let builder = Logger::builder().name("page-host").env_filter("ln_ajax=debug");
        assert!(builder.config.console);
        assert_eq!(builder.config.format, Format::Compact);
        assert_eq!(builder.config.level, LevelFilter::INFO);
        assert_eq!(builder.config.env_filter.as_deref(), Some("ln_ajax=debug"));
        assert!(builder.config.capture_dir.is_none());
    }

    #[test]
    #[serial]
    fn test_builder_configuration() {
        let builder = Logger::builder()
            .name("page-host")
            .json()
            .capture("/tmp/ln-capture", 3)
            .level(LevelFilter::TRACE);

        assert_eq!(builder.config.format, Format::Json);
        assert_eq!(builder.config.level, LevelFilter::TRACE);
        assert_eq!(builder.config.max_files, 3);
        assert_eq!(builder.config.capture_dir.as_deref(), Some(std::path::Path::new("/tmp/ln-capture")));
    }

    #[test]
    #[serial]
    fn test_blank_name_is_rejected() {
        let err = Logger::builder().name("  ").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    #[serial]
    fn test_no_outputs_is_rejected() {
        let err = Logger::builder().name("silent").console(false).init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    #[serial]
    fn test_invalid_filter_is_rejected() {
        let err = Logger::builder().name("filtered").env_filter("ln_ajax=[").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
