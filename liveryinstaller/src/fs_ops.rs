//! Filesystem helpers shared by the pipeline stages.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use walkdir::WalkDir;

use crate::error::{LiveryError, LiveryResult};

/// Reserved name prefix for pipeline scratch directories.
///
/// Anything starting with this prefix inside a package root is leftover
/// working state and never part of the installed content.
pub const SCRATCH_PREFIX: &str = "__temp_";

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Build a unique scratch directory name.
///
/// The name combines the reserved prefix, a purpose tag, the archive stem
/// and a timestamp plus process-wide counter.
pub fn scratch_name(purpose: &str, stem: &str) -> String {
    let counter = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S%6f");
    format!("{}{}_{}_{}_{}", SCRATCH_PREFIX, purpose, short_stem(stem), stamp, counter)
}

/// Unique suffix for generated names outside the scratch area.
pub fn unique_suffix() -> String {
    let counter = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}", chrono::Local::now().format("%Y%m%d%H%M%S"), counter)
}

/// Keep scratch names short; long stems eat into the platform path limit.
fn short_stem(stem: &str) -> String {
    stem.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(24)
        .collect()
}

/// Whether a directory entry is packaging noise rather than content.
pub fn is_ignored_entry(name: &str) -> bool {
    name.starts_with('.') || name == "__MACOSX" || name.starts_with(SCRATCH_PREFIX)
}

/// Recursively copy a directory.
pub fn copy_dir_recursive(source: &Path, dest: &Path) -> LiveryResult<()> {
    fs::create_dir_all(dest).map_err(|e| LiveryError::CreateDirFailed {
        path: dest.to_path_buf(),
        source: e,
    })?;

    for entry in fs::read_dir(source).map_err(|e| LiveryError::ReadFailed {
        path: source.to_path_buf(),
        source: e,
    })? {
        let entry = entry.map_err(|e| LiveryError::ReadFailed {
            path: source.to_path_buf(),
            source: e,
        })?;

        let source_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if source_path.is_dir() {
            copy_dir_recursive(&source_path, &dest_path)?;
        } else {
            fs::copy(&source_path, &dest_path).map_err(|e| LiveryError::CopyFailed {
                from: source_path.clone(),
                to: dest_path,
                source: e,
            })?;
        }
    }

    Ok(())
}

/// Move a file or directory, falling back to copy-then-delete across devices.
pub fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    if from.is_dir() {
        copy_dir_recursive(from, to).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::remove_dir_all(from)
    } else {
        fs::copy(from, to)?;
        fs::remove_file(from)
    }
}

/// Remove a directory tree, logging instead of failing.
pub fn remove_dir_quietly(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = fs::remove_dir_all(path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to clean up directory");
    }
}

/// Find a direct child of `dir` by case-insensitive name.
pub fn find_child_ci(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .flatten()
        .find(|entry| entry.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|entry| entry.path())
}

/// Find a file by case-insensitive name anywhere below `dir`.
///
/// Shallower matches win; packaging noise and scratch directories are
/// skipped.
pub fn find_file_recursive_ci(dir: &Path, name: &str) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored_entry(&e.file_name().to_string_lossy()))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|e| e.into_path())
        .collect();
    matches.sort_by_key(|p| p.components().count());
    matches.into_iter().next()
}

/// Whether a directory exists and holds at least one entry.
pub fn dir_has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Read a text file, dropping bytes that are not valid UTF-8.
///
/// Returns the decoded text together with the raw bytes so callers can
/// tell whether a rewrite would change the file on disk.
pub fn read_text_lossy(path: &Path) -> LiveryResult<(String, Vec<u8>)> {
    let bytes = fs::read(path).map_err(|e| LiveryError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let text = match std::str::from_utf8(&bytes) {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(&bytes).replace('\u{FFFD}', ""),
    };
    Ok((text, bytes))
}

/// File stem as an owned string, or `fallback` when there is none.
pub fn stem_of(path: &Path, fallback: &str) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scratch_names_are_unique_and_prefixed() {
        let a = scratch_name("archive", "My Livery (v2)");
        let b = scratch_name("archive", "My Livery (v2)");
        assert!(a.starts_with("__temp_archive_MyLiveryv2_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_ignored_entries() {
        assert!(is_ignored_entry("__MACOSX"));
        assert!(is_ignored_entry(".DS_Store"));
        assert!(is_ignored_entry("__temp_archive_x"));
        assert!(!is_ignored_entry("texture.ABC"));
    }

    #[test]
    fn test_copy_dir_recursive() {
        let source_temp = TempDir::new().unwrap();
        let dest_temp = TempDir::new().unwrap();

        fs::write(source_temp.path().join("file1.txt"), "hello").unwrap();
        let subdir = source_temp.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("file2.txt"), "world").unwrap();

        let dest = dest_temp.path().join("copied");
        copy_dir_recursive(source_temp.path(), &dest).unwrap();

        assert!(dest.join("subdir/file2.txt").exists());
        assert_eq!(fs::read_to_string(dest.join("file1.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_move_path_directory() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a");
        fs::create_dir(&from).unwrap();
        fs::write(from.join("f.txt"), "x").unwrap();

        let to = temp.path().join("b");
        move_path(&from, &to).unwrap();

        assert!(!from.exists());
        assert!(to.join("f.txt").exists());
    }

    #[test]
    fn test_find_child_ci() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Config.CFG"), "").unwrap();

        let found = find_child_ci(temp.path(), "config.cfg").unwrap();
        assert_eq!(found.file_name().unwrap(), "Config.CFG");
        assert!(find_child_ci(temp.path(), "aircraft.cfg").is_none());
    }

    #[test]
    fn test_find_file_recursive_prefers_shallow_and_skips_noise() {
        let temp = TempDir::new().unwrap();
        let deep = temp.path().join("a/b");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("aircraft.cfg"), "").unwrap();
        fs::create_dir_all(temp.path().join("__MACOSX")).unwrap();
        fs::write(temp.path().join("__MACOSX/aircraft.cfg"), "").unwrap();
        fs::create_dir_all(temp.path().join("c")).unwrap();
        fs::write(temp.path().join("c/Aircraft.cfg"), "").unwrap();

        let found = find_file_recursive_ci(temp.path(), "aircraft.cfg").unwrap();
        assert_eq!(found, temp.path().join("c/Aircraft.cfg"));
    }

    #[test]
    fn test_read_text_lossy_drops_invalid_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.cfg");
        fs::write(&path, b"title=\"A\xffB\"\n").unwrap();

        let (text, bytes) = read_text_lossy(&path).unwrap();
        assert_eq!(text, "title=\"AB\"\n");
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn test_dir_has_entries() {
        let temp = TempDir::new().unwrap();
        assert!(!dir_has_entries(temp.path()));
        fs::create_dir(temp.path().join("d")).unwrap();
        fs::write(temp.path().join("d/x"), "").unwrap();
        fs::write(temp.path().join("y"), "").unwrap();
        assert!(dir_has_entries(temp.path()));
    }
}
