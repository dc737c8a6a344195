//! Logging setup for hosts and the CLI.
//!
//! The library itself only emits `tracing` events. Hosts that have no
//! subscriber of their own can call [`init`] once at startup.

use std::path::Path;

pub use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::error::ConfigError;

/// Build the filter: `RUST_LOG` wins over the configured `level`.
pub fn env_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|_| ConfigError::InvalidValue {
        key: "logging.level".to_string(),
        value: level.to_string(),
    })
}

/// Install the global subscriber.
///
/// Logs go to stderr, and additionally to `file` through a non-blocking
/// writer when one is given. Keep the returned guard alive for the life of the
/// process; dropping it flushes and stops the file writer.
///
/// Calling this when a global subscriber is already set leaves the existing
/// one in place.
pub fn init(level: &str, file: Option<&Path>) -> Result<Option<WorkerGuard>, ConfigError> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter(level)?);

    let (file_layer, guard) = match file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().ok_or_else(|| ConfigError::InvalidValue {
                key: "logging.file".to_string(),
                value: path.display().to_string(),
            })?;

            std::fs::create_dir_all(directory).map_err(|source| ConfigError::Write {
                path: directory.to_path_buf(),
                source,
            })?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(env_filter(level)?);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // A subscriber set earlier (e.g. by a test harness or host) is kept.
    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    Ok(guard)
}
