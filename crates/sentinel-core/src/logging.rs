//! Tracing setup.
//!
//! Logs always go to a daily-rolling file under `${SENTINEL_HOME}/logs`.
//! Headless commands can also mirror them to stderr; the TUI never does,
//! since stderr shares the terminal with the alternate screen.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::paths;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV_VAR: &str = "SENTINEL_LOG";

const LOG_FILE_PREFIX: &str = "sentinel.log";

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub debug: bool,
    pub stderr: bool,
}

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "sentinel_core=debug,sentinel_tui=debug,sentinel=debug,info"
    } else {
        "sentinel_core=info,sentinel_tui=info,sentinel=info,warn"
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    match std::env::var(LOG_ENV_VAR) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(&directive)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(debug))),
        _ => EnvFilter::new(default_directive(debug)),
    }
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process. A second call is a no-op.
///
/// # Errors
/// Returns an error if the log directory cannot be created.
pub fn init(options: LogOptions) -> Result<WorkerGuard> {
    init_in(&paths::logs_dir(), options)
}

/// Like [`init`] with an explicit log directory.
///
/// # Errors
/// Returns an error if the log directory cannot be created.
pub fn init_in(log_dir: &Path, options: LogOptions) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(non_blocking)
        .with_filter(env_filter(options.debug));

    let stderr_layer = options.stderr.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .with_filter(env_filter(options.debug))
    });

    // try_init: tests and repeated setup must not panic
    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    Ok(guard)
}

/// Path of today's log file prefix, for display.
pub fn log_file_hint() -> PathBuf {
    paths::logs_dir().join(LOG_FILE_PREFIX)
}
