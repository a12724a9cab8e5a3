//! Operator settings for one batch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::archive::{ArchiveKind, DEFAULT_CONVERTER_TIMEOUT};
use crate::error::{LiveryError, LiveryResult};
use crate::package::descriptor::{DEFAULT_CREATOR, DEFAULT_MINIMUM_GAME_VERSION};
use crate::package::{DescriptorMetadata, DESCRIPTOR_FILE, LAYOUT_FILE};
use crate::variant::AircraftVariant;

/// Validated configuration for a batch install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSettings {
    /// Aircraft every archive in the batch belongs to.
    pub variant: AircraftVariant,
    /// The simulator's Community folder.
    pub community_dir: PathBuf,
    /// Template directory holding `manifest.json` and `layout.json`.
    pub reference_dir: PathBuf,
    /// The aircraft's host-managed state package directory.
    pub state_dir: PathBuf,
    /// PTP converter executable.
    pub converter: Option<PathBuf>,
    pub converter_timeout: Duration,
    /// Display name override for a single-archive batch.
    pub custom_name: Option<String>,
    pub creator: String,
    pub minimum_game_version: String,
}

/// Issue reported when a batch has no inputs.
pub const NO_INPUTS_ISSUE: &str = "no archives selected";

impl InstallSettings {
    /// Create settings with default converter and descriptor options.
    pub fn new(
        variant: AircraftVariant,
        community_dir: impl Into<PathBuf>,
        reference_dir: impl Into<PathBuf>,
        state_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            variant,
            community_dir: community_dir.into(),
            reference_dir: reference_dir.into(),
            state_dir: state_dir.into(),
            converter: None,
            converter_timeout: DEFAULT_CONVERTER_TIMEOUT,
            custom_name: None,
            creator: DEFAULT_CREATOR.to_string(),
            minimum_game_version: DEFAULT_MINIMUM_GAME_VERSION.to_string(),
        }
    }

    pub fn with_converter(mut self, converter: impl Into<PathBuf>) -> Self {
        self.converter = Some(converter.into());
        self
    }

    pub fn with_converter_timeout(mut self, timeout: Duration) -> Self {
        self.converter_timeout = timeout;
        self
    }

    /// Set a display name; blank names are ignored.
    pub fn with_custom_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.custom_name = if name.trim().is_empty() {
            None
        } else {
            Some(name.trim().to_string())
        };
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    pub fn with_minimum_game_version(mut self, version: impl Into<String>) -> Self {
        self.minimum_game_version = version.into();
        self
    }

    /// Descriptor metadata for this batch.
    pub fn descriptor_metadata(&self) -> DescriptorMetadata {
        DescriptorMetadata::for_variant(self.variant)
            .with_creator(self.creator.clone())
            .with_minimum_game_version(self.minimum_game_version.clone())
    }

    /// Collect every problem with these settings and the given inputs.
    pub fn issues(&self, inputs: &[PathBuf]) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.community_dir.is_dir() {
            issues.push(format!(
                "community folder does not exist: {}",
                self.community_dir.display()
            ));
        }

        if !self.reference_dir.is_dir() {
            issues.push(format!(
                "reference template folder does not exist: {}",
                self.reference_dir.display()
            ));
        } else {
            for name in [DESCRIPTOR_FILE, LAYOUT_FILE] {
                if !self.reference_dir.join(name).is_file() {
                    issues.push(format!(
                        "reference template folder has no {}: {}",
                        name,
                        self.reference_dir.display()
                    ));
                }
            }
        }

        let dependency = self.variant.dependency();
        if !self.state_dir.is_dir() {
            issues.push(format!(
                "aircraft state package folder does not exist: {}",
                self.state_dir.display()
            ));
        } else if folder_name(&self.state_dir) != dependency {
            issues.push(format!(
                "aircraft state package folder must be named '{}' for {}: {}",
                dependency,
                self.variant,
                self.state_dir.display()
            ));
        }

        if inputs.is_empty() {
            issues.push(NO_INPUTS_ISSUE.to_string());
        }
        let mut has_ptp = false;
        for input in inputs {
            if !input.is_file() {
                issues.push(format!("archive not found: {}", input.display()));
                continue;
            }
            match ArchiveKind::from_path(input) {
                Some(ArchiveKind::Ptp) => has_ptp = true,
                Some(ArchiveKind::Zip) => {}
                None => issues.push(format!(
                    "unsupported archive type (expected .zip or .ptp): {}",
                    input.display()
                )),
            }
        }

        if has_ptp {
            match &self.converter {
                Some(converter) if converter.is_file() => {}
                Some(converter) => issues.push(format!(
                    "PTP converter not found: {}",
                    converter.display()
                )),
                None => issues.push("PTP archives selected but no converter configured".to_string()),
            }
        }

        if self.custom_name.is_some() && inputs.len() > 1 {
            issues.push("a custom livery name can only be used with a single archive".to_string());
        }

        issues
    }

    /// Validate before any processing starts.
    pub fn validate(&self, inputs: &[PathBuf]) -> LiveryResult<()> {
        let issues = self.issues(inputs);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(LiveryError::ConfigurationInvalid(issues))
        }
    }
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        settings: InstallSettings,
        archive: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let community = temp.path().join("Community");
        let reference = temp.path().join("ref");
        let state = temp.path().join("pmdg-aircraft-77w");
        for dir in [&community, &reference, &state] {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(reference.join("manifest.json"), "{}").unwrap();
        fs::write(reference.join("layout.json"), "{}").unwrap();
        let archive = temp.path().join("livery.zip");
        fs::write(&archive, "zip").unwrap();

        let settings =
            InstallSettings::new(AircraftVariant::B777_300ER, community, reference, state);
        Fixture {
            _temp: temp,
            settings,
            archive,
        }
    }

    #[test]
    fn test_valid_settings() {
        let f = fixture();
        assert!(f.settings.validate(&[f.archive.clone()]).is_ok());
    }

    #[test]
    fn test_collects_every_issue() {
        let f = fixture();
        let settings = InstallSettings {
            variant: AircraftVariant::B737_800,
            ..f.settings.clone()
        }
        .with_custom_name("Name");
        let ptp = f.archive.with_extension("ptp");
        fs::write(&ptp, "ptp").unwrap();
        let txt = f.archive.with_extension("txt");
        fs::write(&txt, "txt").unwrap();

        let issues = settings.issues(&[f.archive.clone(), ptp, txt]);
        assert_eq!(issues.len(), 4, "{:?}", issues);
        assert!(issues[0].contains("pmdg-aircraft-738"));
        assert!(issues[1].contains("unsupported"));
        assert!(issues[2].contains("no converter"));
        assert!(issues[3].contains("single archive"));

        match settings.validate(&[]) {
            Err(LiveryError::ConfigurationInvalid(issues)) => {
                assert!(issues.iter().any(|i| i == "no archives selected"));
            }
            other => panic!("expected invalid configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_template_files() {
        let f = fixture();
        fs::remove_file(f.settings.reference_dir.join("layout.json")).unwrap();
        let issues = f.settings.issues(&[f.archive.clone()]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("layout.json"));
    }

    #[test]
    fn test_blank_custom_name_is_ignored() {
        let f = fixture();
        assert!(f.settings.with_custom_name("   ").custom_name.is_none());
    }
}
