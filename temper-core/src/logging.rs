//! Logging configuration with rotation support
//!
//! # Example
//!
//! ```rust,no_run
//! use temper_core::logging::{init_logging, LoggingConfig};
//!
//! init_logging(&LoggingConfig::default()).unwrap();
//! ```

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

use crate::error::{Error, Result};

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory to store logs
    pub directory: String,
    /// Prefix for log files (e.g. "temper.log")
    pub filename_prefix: String,
    /// Default log level, overridden by `RUST_LOG`
    pub level: String,
    /// Write the file layer as JSON lines
    pub json: bool,
    /// Attach the Tokio console layer
    pub tokio_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            filename_prefix: "temper.log".to_string(),
            level: "info".to_string(),
            json: false,
            tokio_console: false,
        }
    }
}

/// Initialize logging with daily file rotation and optional Tokio Console
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.filename_prefix)
        .build(&config.directory)
        .map_err(|e| Error::Internal(format!("Failed to create log appender: {}", e)))?;

    // Stdout stays human readable
    let stdout_layer = fmt::layer().with_target(false).compact();

    let file_layer = if config.json {
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .boxed()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer);

    if config.tokio_console {
        let (console_layer, server) = console_subscriber::ConsoleLayer::builder()
            .with_default_env()
            .build();

        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    eprintln!("Console server runtime failed: {}", e);
                    return;
                }
            };

            runtime.block_on(async move {
                if let Err(e) = server.serve().await {
                    eprintln!("Console server failed: {}", e);
                }
            });
        });

        registry
            .with(console_layer)
            .try_init()
            .map_err(|e| Error::Internal(format!("Failed to init tracing: {}", e)))?;
    } else {
        registry
            .try_init()
            .map_err(|e| Error::Internal(format!("Failed to init tracing: {}", e)))?;
    }

    Ok(())
}
