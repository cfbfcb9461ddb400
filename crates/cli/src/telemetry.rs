use std::path::Path;

use {
    tracing::warn,
    tracing_appender::{
        non_blocking::{NonBlocking, WorkerGuard},
        rolling::{Builder, Rotation},
    },
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// Prefix of the daily log files (`tabula.YYYY-MM-DD.log`).
const LOG_FILE_PREFIX: &str = "tabula";

/// Install console logging plus a daily rolling file under `logs_dir`.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process. When the log directory cannot be prepared
/// only console output is installed.
pub fn init(level: &str, json: bool, logs_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard, file_error) = match file_writer(logs_dir) {
        Ok((writer, guard)) => (
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true),
            ),
            Some(guard),
            None,
        ),
        Err(e) => (None, None, Some(e)),
    };

    // Console output goes to stderr so command results on stdout stay clean.
    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_ansi(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!(dir = %logs_dir.display(), error = %e, "file logging disabled");
    }
    guard
}

fn file_writer(logs_dir: &Path) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(logs_dir)?;
    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(logs_dir)?;
    Ok(tracing_appender::non_blocking(appender))
}
