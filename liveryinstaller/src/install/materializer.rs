//! Copies canonical livery content into the package root.
//!
//! Each livery lands in `SimObjects/Airplanes/<variant base> <name>` inside
//! the package root. A previous install under the same name is removed
//! first; if anything fatal goes wrong afterwards the new folder is removed
//! again, so a failed item never leaves a half-built livery behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::sidecar::{atc_id_from_config, sidecar_file_name};
use crate::error::{LiveryError, LiveryResult};
use crate::fs_ops::{copy_dir_recursive, read_text_lossy, remove_dir_quietly};
use crate::staging::{livery_folder_name, CanonicalContent, CONFIG_FILE};
use crate::variant::AircraftVariant;

/// Extensions of auxiliary files copied next to the configuration.
pub const AUX_EXTENSIONS: [&str; 12] = [
    "cfg", "xml", "dat", "txt", "flags", "ttf", "otf", "ini", "sound", "air", "flt", "fdm",
];

/// Files handled elsewhere and never copied as auxiliary files.
const EXCLUDED_FILES: [&str; 8] = [
    "aircraft.cfg",
    "options.ini",
    "layout.json",
    "manifest.json",
    "config.cfg",
    "aircraft.ini",
    "settings.dat",
    "model.cfg",
];

/// Directory inside a package root that holds installed liveries.
pub fn airplanes_dir(package_root: &Path) -> PathBuf {
    package_root.join("SimObjects").join("Airplanes")
}

/// A livery installed into the package root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledLivery {
    /// Folder name under `SimObjects/Airplanes`.
    pub folder_name: String,
    /// Full path of the installed folder.
    pub path: PathBuf,
    /// The installed `aircraft.cfg`.
    pub config: PathBuf,
    /// Names of the installed texture directories.
    pub texture_dirs: Vec<String>,
    /// Number of auxiliary files copied.
    pub aux_copied: usize,
}

/// Copy a single file, distinguishing over-long destination paths.
fn copy_file(from: &Path, to: &Path) -> LiveryResult<()> {
    fs::copy(from, to).map(|_| ()).map_err(|e| {
        if LiveryError::is_name_too_long(&e) {
            LiveryError::PathTooLong {
                path: to.to_path_buf(),
                source: e,
            }
        } else {
            LiveryError::CopyFailed {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source: e,
            }
        }
    })
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether a root-level file belongs to the auxiliary allow-list.
pub fn is_auxiliary_file(name: &str, atc_id: Option<&str>) -> bool {
    let lower = name.to_ascii_lowercase();
    if EXCLUDED_FILES.contains(&lower.as_str()) {
        return false;
    }
    if let Some(id) = atc_id {
        if lower == sidecar_file_name(id).to_ascii_lowercase() {
            return false;
        }
    }
    Path::new(&lower)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| AUX_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Copy auxiliary files from the content root. Failures only warn.
fn copy_auxiliary_files(content: &CanonicalContent, dest: &Path) -> usize {
    let atc_id = read_text_lossy(&content.config)
        .ok()
        .and_then(|(text, _)| atc_id_from_config(&text));
    let Ok(entries) = fs::read_dir(&content.root) else {
        return 0;
    };

    let mut copied = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if !path.is_file() || !is_auxiliary_file(&name, atc_id.as_deref()) {
            continue;
        }
        match copy_file(&path, &dest.join(&name)) {
            Ok(()) => {
                debug!(file = %name, "Copied auxiliary file");
                copied += 1;
            }
            Err(e) => warn!(file = %name, error = %e, "Could not copy auxiliary file"),
        }
    }
    copied
}

fn populate(content: &CanonicalContent, dest: &Path) -> LiveryResult<InstalledLivery> {
    if !content.config.is_file() {
        return Err(LiveryError::StagedContentIncomplete {
            path: content.config.clone(),
            reason: format!("{} is missing", CONFIG_FILE),
        });
    }
    let config = dest.join(CONFIG_FILE);
    copy_file(&content.config, &config)?;

    for model in content.model_dirs() {
        let name = dir_name(&model);
        copy_dir_recursive(&model, &dest.join(&name))?;
        debug!(dir = %name, "Copied model directory");
    }

    let textures = content.texture_dirs();
    if textures.is_empty() {
        return Err(LiveryError::StagedContentIncomplete {
            path: content.root.clone(),
            reason: "no texture directory found".to_string(),
        });
    }
    let mut texture_dirs = Vec::with_capacity(textures.len());
    for texture in textures {
        let name = dir_name(&texture);
        copy_dir_recursive(&texture, &dest.join(&name))?;
        debug!(dir = %name, "Copied texture directory");
        texture_dirs.push(name);
    }

    let aux_copied = copy_auxiliary_files(content, dest);

    Ok(InstalledLivery {
        folder_name: dir_name(dest),
        path: dest.to_path_buf(),
        config,
        texture_dirs,
        aux_copied,
    })
}

/// Install canonical content as a livery folder inside `package_root`.
pub fn materialize(
    content: &CanonicalContent,
    package_root: &Path,
    variant: AircraftVariant,
    display_name: &str,
    archive_stem: &str,
) -> LiveryResult<InstalledLivery> {
    let folder_name = livery_folder_name(variant, display_name, archive_stem);
    let dest = airplanes_dir(package_root).join(&folder_name);

    if dest.exists() {
        info!(path = %dest.display(), "Replacing existing livery");
        fs::remove_dir_all(&dest).map_err(|e| LiveryError::DestinationConflict {
            path: dest.clone(),
            source: e,
        })?;
    }
    fs::create_dir_all(&dest).map_err(|e| {
        if LiveryError::is_name_too_long(&e) {
            LiveryError::PathTooLong {
                path: dest.clone(),
                source: e,
            }
        } else {
            LiveryError::CreateDirFailed {
                path: dest.clone(),
                source: e,
            }
        }
    })?;

    match populate(content, &dest) {
        Ok(installed) => {
            info!(
                folder = %installed.folder_name,
                textures = installed.texture_dirs.len(),
                aux = installed.aux_copied,
                "Livery files copied"
            );
            Ok(installed)
        }
        Err(e) => {
            remove_dir_quietly(&dest);
            Err(e)
        }
    }
}
