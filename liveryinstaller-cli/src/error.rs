//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

use liveryinstaller::config::ConfigFileError;
use liveryinstaller::LiveryError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Configuration file could not be loaded
    ConfigFile(ConfigFileError),
    /// The batch could not start or aborted during setup
    Batch(LiveryError),
    /// The batch worker thread could not be started or panicked
    Worker(String),
    /// The batch ran but some liveries failed
    ItemsFailed { failed: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Batch(LiveryError::ConfigurationInvalid(_)) | CliError::Config(_) => {
                eprintln!();
                eprintln!("Paths can be given on the command line or in:");
                eprintln!(
                    "  {}",
                    liveryinstaller::config::config_file_path().display()
                );
            }
            CliError::ItemsFailed { .. } => {
                eprintln!();
                eprintln!(
                    "Details are in the log: {}",
                    liveryinstaller::logging::default_log_dir()
                        .join(liveryinstaller::logging::default_log_file())
                        .display()
                );
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Batch(e) => write!(f, "Installation aborted: {}", e),
            CliError::Worker(msg) => write!(f, "Batch worker failed: {}", msg),
            CliError::ItemsFailed { failed } => {
                write!(f, "{} livery installation(s) failed", failed)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Batch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LiveryError> for CliError {
    fn from(e: LiveryError) -> Self {
        CliError::Batch(e)
    }
}
