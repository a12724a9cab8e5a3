//! CLI runner for common setup.
//!
//! Loads the configuration file and initializes logging so command handlers
//! start from the same state.

use tracing::{info, Level};

use liveryinstaller::config::ConfigFile;
use liveryinstaller::logging::{default_log_dir, default_log_file, init_logging, LoggingGuard};

use crate::error::CliError;

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// The console only shows warnings unless `verbose` is set; the log file
    /// always receives the full record.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let log_dir = config
            .paths
            .log_dir
            .clone()
            .unwrap_or_else(default_log_dir);
        let console_level = if verbose { Level::DEBUG } else { Level::WARN };

        let logging_guard = init_logging(&log_dir, default_log_file(), console_level)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Path of the active log file.
    pub fn log_path(&self) -> &std::path::Path {
        self.logging_guard.log_path()
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Livery Installer v{}", liveryinstaller::VERSION);
        info!("Livery Installer CLI: {} command", command);
    }
}
