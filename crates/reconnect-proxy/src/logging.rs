//! Logging setup for applications using the proxy
//!
//! The proxy only emits `tracing` events: a warning per retry, debug events
//! when nested handles are wrapped and trace events for pass-through
//! members. Applications that have no subscriber of their own can install
//! one here:
//! - console output through `tracing-subscriber`'s fmt layer
//! - optional JSON log files rotated daily by `tracing-appender`
//! - filtering via RUST_LOG, falling back to a configured default

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log file name prefix inside `log_dir`
pub const LOG_FILE_PREFIX: &str = "reconnect-proxy.log";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory for JSON log files; `None` disables file output
    pub log_dir: Option<PathBuf>,

    /// Whether to print human-readable logs to stderr
    pub enable_console_logs: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Default filter, used when RUST_LOG is unset or invalid
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl LoggingConfig {
    /// Retry warnings only, written as JSON to `log_dir`
    pub fn production(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: Some(log_dir.into()),
            enable_console_logs: false,
            include_location: false,
            default_filter: "warn,reconnect_proxy=warn,reconnect_core=warn".to_string(),
        }
    }

    /// Verbose console output, no files
    pub fn development() -> Self {
        Self {
            log_dir: None,
            enable_console_logs: true,
            include_location: cfg!(debug_assertions),
            default_filter: "info,reconnect_proxy=debug,reconnect_core=debug".to_string(),
        }
    }

    /// Everything to the console, including pass-through traces
    pub fn testing() -> Self {
        Self {
            log_dir: None,
            enable_console_logs: true,
            include_location: true,
            default_filter: "trace".to_string(),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        // RUST_LOG takes precedence over the default filter
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install a global subscriber built from `config`
///
/// When file logging is enabled the returned guard flushes the background
/// writer on drop, so keep it alive for the lifetime of the program.
/// Fails if a global subscriber is already installed.
pub fn init(config: LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let mut layers = Vec::new();
    let mut guard = None;

    if config.enable_console_logs {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .with_filter(config.env_filter())
            .boxed();

        layers.push(console_layer);
    }

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
        let (non_blocking, worker) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_writer(non_blocking)
            .with_filter(config.env_filter())
            .boxed();

        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::info!(
        log_dir = ?config.log_dir,
        console_enabled = config.enable_console_logs,
        "logging initialized"
    );

    Ok(guard)
}

/// Initialize logging with the development configuration
pub fn init_default() -> anyhow::Result<Option<WorkerGuard>> {
    init(LoggingConfig::development())
}
