//! Structured logging for modemnet
//!
//! Console output is JSONL by default, pretty when asked for, and can be
//! mirrored to a file through `tracing-appender`. `RUST_LOG` overrides the
//! configured level.
//!
//! # Quick Start
//!
//! ```no_run
//! use modemnet_logging::{LogConfig, ModemnetSubscriberBuilder};
//!
//! // JSONL to the console
//! let _guard = ModemnetSubscriberBuilder::new().init().unwrap();
//! ```
//!
//! ```no_run
//! # use modemnet_logging::{LogConfig, ModemnetSubscriberBuilder};
//! // Pretty output while developing
//! let _guard = ModemnetSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init()
//!     .unwrap();
//! ```
//!
//! # Device Context
//!
//! [`DeviceContextGuard`] tags every span opened in its scope with the
//! device doing the work, so interleaved logs from many modems can be told
//! apart.

pub mod config;
pub mod context;
pub mod layers;

pub use config::{ConsoleConfig, FileConfig, JsonlConfig, LogConfig, RotationStrategy};
pub use context::{DeviceContextData, DeviceContextGuard};
pub use layers::{DeviceContextExtension, DeviceContextLayer};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layer, Layered, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Registry};

use crate::layers::BoxedLayer;

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to prepare log file in {directory}: {source}")]
    LogFile {
        directory: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// The installed subscriber: the level filter wraps every output layer
pub type ModemnetSubscriber = Layered<EnvFilter, Layered<Vec<BoxedLayer>, Registry>>;

/// Builder for configuring and installing the modemnet subscriber
pub struct ModemnetSubscriberBuilder {
    config: LogConfig,
    env_override: bool,
}

impl ModemnetSubscriberBuilder {
    /// Default configuration: JSONL to the console at `info`
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
            env_override: true,
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.config.console.pretty = pretty;
        self
    }

    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// Whether `RUST_LOG` replaces the configured levels (on by default)
    pub fn with_env_override(mut self, enabled: bool) -> Self {
        self.env_override = enabled;
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally
    ///
    /// The returned guard flushes file output when dropped and must be kept
    /// alive for as long as logging is needed.
    pub fn init(self) -> Result<Option<WorkerGuard>, LogError> {
        let (subscriber, guard) = self.build()?;
        subscriber.try_init()?;
        Ok(guard)
    }

    /// Build the subscriber without installing it, e.g. for
    /// `tracing::subscriber::with_default`
    pub fn build(self) -> Result<(ModemnetSubscriber, Option<WorkerGuard>), LogError> {
        let filter = self.filter()?;
        let (stack, guard) = self.build_layers()?;
        // Outermost, so it gates every layer below it
        Ok((Registry::default().with(stack).with(filter), guard))
    }

    fn filter(&self) -> Result<EnvFilter, LogError> {
        if self.env_override {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                return Ok(filter);
            }
        }
        EnvFilter::try_new(self.config.directives()).map_err(|e| LogError::Filter(e.to_string()))
    }

    fn build_layers(&self) -> Result<(Vec<BoxedLayer>, Option<WorkerGuard>), LogError> {
        let mut stack: Vec<BoxedLayer> = vec![DeviceContextLayer::new().boxed()];

        if self.config.console.enabled {
            let console = if self.config.console.pretty {
                layers::pretty_layer(self.config.console.ansi)
            } else {
                layers::jsonl_layer(std::io::stdout, &self.config.jsonl)
            };
            stack.push(console);
        }

        let mut guard = None;
        if let Some(file) = &self.config.file {
            let (writer, file_guard) = file_writer(file)?;
            stack.push(layers::jsonl_layer(writer, &self.config.jsonl));
            guard = Some(file_guard);
        }

        Ok((stack, guard))
    }
}

impl Default for ModemnetSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking writer for file output; `Never` truncates a single file
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LogError> {
    let log_file_error = |source| LogError::LogFile {
        directory: config.directory.display().to_string(),
        source,
    };

    fs::create_dir_all(&config.directory).map_err(log_file_error)?;
    let rotation = match config.rotation {
        RotationStrategy::Never => {
            let path = config.directory.join(format!("{}.log", config.prefix));
            let file = File::create(path).map_err(log_file_error)?;
            return Ok(tracing_appender::non_blocking(file));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };
    let appender = RollingFileAppender::new(rotation, &config.directory, &config.prefix);
    Ok(tracing_appender::non_blocking(appender))
}

/// Install JSONL console logging with default settings
pub fn init_default() -> Result<Option<WorkerGuard>, LogError> {
    ModemnetSubscriberBuilder::new().init()
}

/// Install pretty, verbose console logging
pub fn init_development() -> Result<Option<WorkerGuard>, LogError> {
    ModemnetSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
}

/// Install warn-level logging for tests; later calls are no-ops
pub fn init_testing() {
    let _ = ModemnetSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .init();
}
