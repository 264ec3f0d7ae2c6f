use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Rotated files kept next to the active one.
const LOG_FILES_KEPT: usize = 5;

fn env_filter(debug: bool) -> EnvFilter {
    let default_level = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Human-readable logs on stderr plus daily-rotated JSON logs in `log_dir`.
///
/// The returned guard flushes the file writer on drop, so hold it for the
/// lifetime of the process. If `log_dir` is not writable only stderr is used.
pub fn init_frontend(log_dir: &Path, debug: bool) -> Option<WorkerGuard> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("frontend")
        .filename_suffix("log")
        .max_log_files(LOG_FILES_KEPT)
        .build(log_dir);

    let (file_layer, guard, file_error) = match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!(
            log_dir = %log_dir.display(),
            error = %e,
            "Log directory not writable, logging to stderr only"
        );
    }

    guard
}

/// Stderr-only logging for the remediation CLI; stdout stays free.
pub fn init_cli(debug: bool) {
    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
