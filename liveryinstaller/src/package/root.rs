//! The community package a batch installs into.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{DESCRIPTOR_FILE, LAYOUT_FILE};
use crate::error::{LiveryError, LiveryResult};
use crate::install::airplanes_dir;
use crate::variant::AircraftVariant;

/// A variant's livery package inside the community folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRoot {
    path: PathBuf,
    variant: AircraftVariant,
}

impl PackageRoot {
    /// Package root location for a variant, without touching the disk.
    pub fn locate(community_dir: &Path, variant: AircraftVariant) -> Self {
        Self {
            path: community_dir.join(variant.package_folder()),
            variant,
        }
    }

    /// Create the package root on first use and seed it from the template.
    ///
    /// `manifest.json` and `layout.json` are copied from `reference_dir`
    /// only when the package does not have them yet. A missing template file
    /// is a setup error.
    pub fn prepare(
        community_dir: &Path,
        variant: AircraftVariant,
        reference_dir: &Path,
    ) -> LiveryResult<Self> {
        let root = Self::locate(community_dir, variant);
        fs::create_dir_all(root.airplanes_dir()).map_err(|e| LiveryError::CreateDirFailed {
            path: root.airplanes_dir(),
            source: e,
        })?;

        for name in [DESCRIPTOR_FILE, LAYOUT_FILE] {
            let target = root.path.join(name);
            if target.exists() {
                continue;
            }
            let template = reference_dir.join(name);
            if !template.is_file() {
                return Err(LiveryError::ConfigurationInvalid(vec![format!(
                    "reference template is missing {}",
                    template.display()
                )]));
            }
            fs::copy(&template, &target).map_err(|e| LiveryError::CopyFailed {
                from: template.clone(),
                to: target.clone(),
                source: e,
            })?;
            info!(file = name, package = %root.path.display(), "Copied template into package");
        }

        Ok(root)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn variant(&self) -> AircraftVariant {
        self.variant
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.path.join(DESCRIPTOR_FILE)
    }

    pub fn layout_path(&self) -> PathBuf {
        self.path.join(LAYOUT_FILE)
    }

    /// `SimObjects/Airplanes` inside the package.
    pub fn airplanes_dir(&self) -> PathBuf {
        airplanes_dir(&self.path)
    }
}
