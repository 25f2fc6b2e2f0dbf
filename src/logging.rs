use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the background log writer alive; logs stop flushing once dropped.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Routes tracing output to a daily log file in `log_dir`. The terminal is
/// owned by the UI, so nothing is written to stdout or stderr.
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init_tracing(log_dir: &Path, default_level: &str) -> Option<LogGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {}: {err}", log_dir.display());
        return None;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "nback.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init();

    match installed {
        Ok(()) => Some(LogGuard { _guard: guard }),
        Err(_) => None,
    }
}
