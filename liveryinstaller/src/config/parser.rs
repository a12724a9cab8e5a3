//! INI parsing logic for converting `Ini` → `ConfigFile`.

use std::path::PathBuf;

use ini::Ini;

use super::file::{ConfigFile, ConfigFileError};
use crate::variant::AircraftVariant;

fn invalid(section: &str, key: &str, value: &str, reason: impl Into<String>) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn non_empty(v: &str) -> Option<&str> {
    let v = v.trim();
    (!v.is_empty()).then_some(v)
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [paths] section
    if let Some(section) = ini.section(Some("paths")) {
        if let Some(v) = section.get("community_dir").and_then(non_empty) {
            config.paths.community_dir = Some(expand_tilde(v));
        }
        if let Some(v) = section.get("reference_dir").and_then(non_empty) {
            config.paths.reference_dir = Some(expand_tilde(v));
        }
        if let Some(v) = section.get("converter").and_then(non_empty) {
            config.paths.converter = Some(expand_tilde(v));
        }
        if let Some(v) = section.get("log_dir").and_then(non_empty) {
            config.paths.log_dir = Some(expand_tilde(v));
        }
    }

    // [state] section: one state package directory per dependency
    if let Some(section) = ini.section(Some("state")) {
        let known = AircraftVariant::dependencies();
        for (key, value) in section.iter() {
            let key = key.trim().to_ascii_lowercase();
            if !known.contains(&key) {
                return Err(invalid(
                    "state",
                    &key,
                    value,
                    format!("unknown aircraft package, expected one of: {}", known.join(", ")),
                ));
            }
            if let Some(v) = non_empty(value) {
                config.state.insert(key, expand_tilde(v));
            }
        }
    }

    // [install] section
    if let Some(section) = ini.section(Some("install")) {
        if let Some(v) = section.get("variant").and_then(non_empty) {
            let variant = v
                .parse::<AircraftVariant>()
                .map_err(|e| invalid("install", "variant", v, e.to_string()))?;
            config.install.variant = Some(variant);
        }
        if let Some(v) = section.get("converter_timeout_secs").and_then(non_empty) {
            let secs = v.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                invalid(
                    "install",
                    "converter_timeout_secs",
                    v,
                    "must be a positive number of seconds",
                )
            })?;
            config.install.converter_timeout_secs = Some(secs);
        }
        if let Some(v) = section.get("creator").and_then(non_empty) {
            config.install.creator = Some(v.to_string());
        }
        if let Some(v) = section.get("minimum_game_version").and_then(non_empty) {
            let valid = v
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
            if !valid {
                return Err(invalid(
                    "install",
                    "minimum_game_version",
                    v,
                    "must be dotted numbers such as 1.37.19",
                ));
            }
            config.install.minimum_game_version = Some(v.to_string());
        }
    }

    Ok(config)
}

/// Expand a leading `~/` to the user's home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        parse_ini(&Ini::load_from_str(text).unwrap())
    }

    #[test]
    fn test_empty_ini_is_default() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_paths_expand_tilde() {
        let config = parse("[paths]\nreference_dir = ~/ref\nconverter = /opt/conv\nlog_dir =\n").unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(config.paths.reference_dir, Some(home.join("ref")));
        assert_eq!(config.paths.converter, Some(PathBuf::from("/opt/conv")));
        assert_eq!(config.paths.log_dir, None);
    }

    #[test]
    fn test_expand_tilde_leaves_other_paths() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("rel/~/x"), PathBuf::from("rel/~/x"));
    }

    #[test]
    fn test_invalid_variant() {
        let err = parse("[install]\nvariant = 747-8\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "variant"
        ));
        assert!(err.to_string().contains("install.variant = '747-8'"));
    }

    #[test]
    fn test_invalid_timeout() {
        for value in ["0", "-5", "soon"] {
            let text = format!("[install]\nconverter_timeout_secs = {}\n", value);
            assert!(parse(&text).is_err(), "{} should be rejected", value);
        }
    }

    #[test]
    fn test_unknown_state_key() {
        let err = parse("[state]\npmdg-aircraft-747 = /x\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref section, .. } if section == "state"));
    }

    #[test]
    fn test_install_values() {
        let config = parse(
            "[install]\ncreator = Someone\nminimum_game_version = 1.38.2\n",
        )
        .unwrap();
        assert_eq!(config.install.creator.as_deref(), Some("Someone"));
        assert_eq!(config.install.minimum_game_version.as_deref(), Some("1.38.2"));
        assert!(parse("[install]\nminimum_game_version = latest\n").is_err());
    }
}
