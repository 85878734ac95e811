//! Log output for the mounter binary.

use rclone_mounter_core::Settings;
use rclone_mounter_core::settings::MOUNTER_LOG_FILE;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
///
/// Appends to `Mounter.log` in the configured log folder. When the folder
/// cannot be prepared, logs go to stderr instead and `None` is returned.
/// The returned guard must live until the process exits so buffered lines
/// are flushed.
pub fn init(settings: &Settings) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = std::fs::create_dir_all(&settings.log_folder)
        .map_err(|e| e.to_string())
        .and_then(|()| {
            RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(MOUNTER_LOG_FILE)
                .build(&settings.log_folder)
                .map_err(|e| e.to_string())
        });

    match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter);
            tracing_subscriber::registry().with(file_layer).init();
            Some(guard)
        }
        Err(e) => {
            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter);
            tracing_subscriber::registry().with(stderr_layer).init();
            tracing::warn!(
                "Cannot log to {}: {}",
                settings.mounter_log_path().display(),
                e
            );
            None
        }
    }
}
