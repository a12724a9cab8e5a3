//! Configuration file handling for ~/.liveryinstaller/config.ini.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::variant::AircraftVariant;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[paths]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathsSection {
    /// Simulator community folder.
    pub community_dir: Option<PathBuf>,
    /// Directory holding the template `manifest.json` and `layout.json`.
    pub reference_dir: Option<PathBuf>,
    /// External PTP converter executable.
    pub converter: Option<PathBuf>,
    /// Log directory override.
    pub log_dir: Option<PathBuf>,
}

/// `[install]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSection {
    pub variant: Option<AircraftVariant>,
    pub converter_timeout_secs: Option<u64>,
    pub creator: Option<String>,
    pub minimum_game_version: Option<String>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub paths: PathsSection,
    /// State package directories keyed by dependency package name.
    pub state: BTreeMap<String, PathBuf>,
    pub install: InstallSection,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.liveryinstaller/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// State package directory configured for a variant's base aircraft.
    pub fn state_dir_for(&self, variant: AircraftVariant) -> Option<&Path> {
        self.state.get(&variant.dependency()).map(PathBuf::as_path)
    }

    /// Converter timeout, when configured.
    pub fn converter_timeout(&self) -> Option<Duration> {
        self.install.converter_timeout_secs.map(Duration::from_secs)
    }
}

/// Configuration directory (`~/.liveryinstaller`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".liveryinstaller")
}

/// Configuration file path (`~/.liveryinstaller/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
