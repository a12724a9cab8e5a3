//! Settings arguments shared by `install` and `check`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use liveryinstaller::batch::InstallSettings;
use liveryinstaller::config::ConfigFile;
use liveryinstaller::AircraftVariant;

use crate::error::CliError;

/// Installation settings; each falls back to config.ini when omitted.
#[derive(Debug, Clone, Default, Args)]
pub struct SettingsArgs {
    /// Aircraft variant (e.g. 777-300ER, 737-800); see `livery-installer variants`
    #[arg(long)]
    pub variant: Option<AircraftVariant>,

    /// MSFS community folder
    #[arg(long)]
    pub community_dir: Option<PathBuf>,

    /// Folder holding the template manifest.json and layout.json
    #[arg(long)]
    pub reference_dir: Option<PathBuf>,

    /// Aircraft state package folder (named after the aircraft package)
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// PTP converter executable
    #[arg(long)]
    pub converter: Option<PathBuf>,

    /// Livery name to use instead of the archive's title (single archive only)
    #[arg(long)]
    pub name: Option<String>,

    /// Converter timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

fn required<T>(value: Option<T>, flag: &str, key: &str) -> Result<T, CliError> {
    value.ok_or_else(|| {
        CliError::Config(format!(
            "missing {}. Use {} or set {} in config.ini",
            flag.trim_start_matches("--").replace('-', " "),
            flag,
            key
        ))
    })
}

/// Resolve install settings from CLI args and config.
///
/// CLI values take precedence over config.ini.
pub fn resolve_settings(
    args: SettingsArgs,
    config: &ConfigFile,
) -> Result<InstallSettings, CliError> {
    let variant = required(
        args.variant.or(config.install.variant),
        "--variant",
        "install.variant",
    )?;
    let community_dir = required(
        args.community_dir.or_else(|| config.paths.community_dir.clone()),
        "--community-dir",
        "paths.community_dir",
    )?;
    let reference_dir = required(
        args.reference_dir.or_else(|| config.paths.reference_dir.clone()),
        "--reference-dir",
        "paths.reference_dir",
    )?;
    let state_dir = required(
        args.state_dir
            .or_else(|| config.state_dir_for(variant).map(PathBuf::from)),
        "--state-dir",
        &format!("state.{}", variant.dependency()),
    )?;

    let mut settings = InstallSettings::new(variant, community_dir, reference_dir, state_dir);

    if let Some(converter) = args.converter.or_else(|| config.paths.converter.clone()) {
        settings = settings.with_converter(converter);
    }
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .or_else(|| config.converter_timeout());
    if let Some(timeout) = timeout {
        if timeout.is_zero() {
            return Err(CliError::Config(
                "--timeout must be at least one second".to_string(),
            ));
        }
        settings = settings.with_converter_timeout(timeout);
    }
    if let Some(name) = args.name {
        settings = settings.with_custom_name(name);
    }
    if let Some(creator) = &config.install.creator {
        settings = settings.with_creator(creator.clone());
    }
    if let Some(version) = &config.install.minimum_game_version {
        settings = settings.with_minimum_game_version(version.clone());
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let mut config = ConfigFile::default();
        config.install.variant = Some(AircraftVariant::B777F);
        config.paths.community_dir = Some(PathBuf::from("/config/community"));
        config.paths.reference_dir = Some(PathBuf::from("/config/reference"));
        config
            .state
            .insert("pmdg-aircraft-77w".to_string(), PathBuf::from("/state/77w"));

        let args = SettingsArgs {
            variant: Some(AircraftVariant::B777_300ER),
            community_dir: Some(PathBuf::from("/cli/community")),
            timeout: Some(30),
            ..SettingsArgs::default()
        };

        let settings = resolve_settings(args, &config).unwrap();
        assert_eq!(settings.variant, AircraftVariant::B777_300ER);
        assert_eq!(settings.community_dir, PathBuf::from("/cli/community"));
        assert_eq!(settings.reference_dir, PathBuf::from("/config/reference"));
        assert_eq!(settings.state_dir, PathBuf::from("/state/77w"));
        assert_eq!(settings.converter_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_value_names_flag_and_key() {
        let args = SettingsArgs {
            variant: Some(AircraftVariant::B737_800),
            community_dir: Some(PathBuf::from("/c")),
            reference_dir: Some(PathBuf::from("/r")),
            ..SettingsArgs::default()
        };
        let err = resolve_settings(args, &ConfigFile::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("--state-dir"));
        assert!(message.contains("state.pmdg-aircraft-738"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let args = SettingsArgs {
            variant: Some(AircraftVariant::B737_800),
            community_dir: Some(PathBuf::from("/c")),
            reference_dir: Some(PathBuf::from("/r")),
            state_dir: Some(PathBuf::from("/s")),
            timeout: Some(0),
            ..SettingsArgs::default()
        };
        assert!(resolve_settings(args, &ConfigFile::default()).is_err());
    }
}
