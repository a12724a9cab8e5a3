//! Livery-or-pack classification of extracted archives.
//!
//! Authors frequently bundle several liveries into one ZIP of ZIPs. A real
//! livery always ships its own texture directory and configuration file, so
//! a directory with archives but neither of those is treated as a pack and
//! its archives are queued individually.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::reorganizer::{is_texture_dir_name, ALT_CONFIG_FILE, CONFIG_FILE};
use crate::archive::ArchiveKind;
use crate::error::{LiveryError, LiveryResult};
use crate::fs_ops::is_ignored_entry;

/// What an extracted directory turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentShape {
    /// A single livery rooted at the given directory.
    Livery(PathBuf),
    /// A pack of further archives, in name order.
    Pack(Vec<PathBuf>),
}

/// Entry counts for one directory level.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectoryCensus {
    pub archives: Vec<PathBuf>,
    pub texture_dirs: usize,
    pub has_config: bool,
    pub other_entries: usize,
}

impl DirectoryCensus {
    /// Count the entries directly inside `dir`.
    pub fn of(dir: &Path) -> LiveryResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| LiveryError::ReadFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut census = Self::default();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_ignored_entry(&name) {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                if is_texture_dir_name(&name) {
                    census.texture_dirs += 1;
                } else {
                    census.other_entries += 1;
                }
            } else if ArchiveKind::from_path(&path).is_some() {
                census.archives.push(path);
            } else {
                if name.eq_ignore_ascii_case(CONFIG_FILE) || name.eq_ignore_ascii_case(ALT_CONFIG_FILE)
                {
                    census.has_config = true;
                }
                census.other_entries += 1;
            }
        }

        census.archives.sort_by_key(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default()
        });
        Ok(census)
    }

    /// Whether this level looks like a wrapper around further archives.
    pub fn is_pack(&self) -> bool {
        !self.archives.is_empty() && self.texture_dirs == 0 && !self.has_config
    }
}

/// Step through a single enclosing directory, once.
///
/// Archives often wrap their content in one top-level folder named after the
/// livery. When `dir` holds exactly one directory and nothing else, that
/// directory is returned; otherwise `dir` itself.
pub fn unwrap_single_dir(dir: &Path) -> PathBuf {
    let Ok(entries) = fs::read_dir(dir) else {
        return dir.to_path_buf();
    };
    let children: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| !is_ignored_entry(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .collect();

    match children.as_slice() {
        [only] if only.is_dir() => {
            debug!(wrapper = %only.display(), "Unwrapping single top-level directory");
            only.clone()
        }
        _ => dir.to_path_buf(),
    }
}

/// Classify an extracted directory as a livery or a pack of archives.
pub fn classify(dir: &Path) -> LiveryResult<ContentShape> {
    let root = unwrap_single_dir(dir);
    let census = DirectoryCensus::of(&root)?;
    debug!(
        dir = %root.display(),
        archives = census.archives.len(),
        textures = census.texture_dirs,
        others = census.other_entries,
        "Classified extracted content"
    );

    if census.is_pack() {
        Ok(ContentShape::Pack(census.archives))
    } else {
        Ok(ContentShape::Livery(root))
    }
}
