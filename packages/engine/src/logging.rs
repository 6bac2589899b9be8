use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Daily log files are named `spelling.log.YYYY-MM-DD`.
const LOG_FILE_PREFIX: &str = "spelling.log";
const DEFAULT_LOG_DIR: &str = "./logs";

/// Owns the background writer of the rolling log file. Dropping it flushes
/// buffered lines and stops file output, so hold it until the process exits.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// `ENABLE_FILE_LOGS` set to `true` or `1` turns on the rolling log file.
pub fn file_logging_enabled() -> bool {
    flag_enabled(std::env::var("ENABLE_FILE_LOGS").ok().as_deref())
}

fn flag_enabled(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("true" | "1"))
}

/// Installs the global subscriber: human-readable lines on stderr, plus a
/// daily rolling file under `LOG_DIR` when file logging is enabled.
///
/// Stdout stays free for the admin tool's JSON output. A second call is a no-op.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    if file_logging_enabled() {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
        if let Err(err) = std::fs::create_dir_all(&log_dir) {
            eprintln!("failed to create log directory {log_dir}: {err}");
        } else {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true);

            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init();

            return Some(FileLogGuard { _guard: guard });
        }
    }

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logging_flag_accepts_true_and_one() {
        assert!(flag_enabled(Some("true")));
        assert!(flag_enabled(Some(" 1 ")));
        assert!(!flag_enabled(Some("yes")));
        assert!(!flag_enabled(Some("")));
        assert!(!flag_enabled(None));
    }
}
