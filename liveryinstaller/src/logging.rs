//! Logging for the livery installer.
//!
//! Two outputs:
//! - a persistent log file, truncated at session start, holding the full
//!   detail of every run (`~/.liveryinstaller/logs/liveryinstaller.log`)
//! - console output on stderr at the level the front end asks for
//!
//! The file level is configurable via the RUST_LOG environment variable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    log_path: PathBuf,
}

impl LoggingGuard {
    /// Path of the log file being written.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Initialize logging.
///
/// Creates the log directory if needed, clears the previous log file, and
/// installs the global subscriber. Console output is limited to
/// `console_level`; the file receives everything the env filter allows,
/// which is at least `info`.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log file
/// cannot be cleared.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    console_level: Level,
) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(log_file);
    fs::write(&log_path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_timer(LocalTime::rfc_3339())
        .with_target(false);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(LevelFilter::from_level(console_level));

    let default_level = if console_level > Level::INFO {
        console_level
    } else {
        Level::INFO
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_path,
    })
}

/// Default log directory (`~/.liveryinstaller/logs`).
pub fn default_log_dir() -> PathBuf {
    crate::config::config_directory().join("logs")
}

/// Default log file name.
pub fn default_log_file() -> &'static str {
    "liveryinstaller.log"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_appender::non_blocking::NonBlocking;

    #[test]
    fn test_default_paths() {
        assert_eq!(default_log_file(), "liveryinstaller.log");
        let dir = default_log_dir();
        assert!(dir.ends_with(".liveryinstaller/logs"));
    }

    #[test]
    fn test_guard_exposes_log_path() {
        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let logging_guard = LoggingGuard {
            _file_guard: guard,
            log_path: PathBuf::from("logs/liveryinstaller.log"),
        };
        assert_eq!(
            logging_guard.log_path(),
            Path::new("logs/liveryinstaller.log")
        );
    }

    // The global subscriber can only be installed once per process, so
    // init_logging itself is exercised by the CLI rather than here.
}
