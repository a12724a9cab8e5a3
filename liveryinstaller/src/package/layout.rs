//! Content manifest (`layout.json`) generation.
//!
//! Every file in the package root is listed with its root-relative path,
//! size and modification time in Windows FILETIME ticks. The manifest and
//! descriptor themselves are left out, as are dotfiles, `Thumbs.db` and
//! pipeline scratch directories.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{to_json_bytes, DESCRIPTOR_FILE, LAYOUT_FILE};
use crate::error::{LiveryError, LiveryResult};
use crate::fs_ops::SCRATCH_PREFIX;

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_EPOCH_OFFSET_SECS: u64 = 11_644_473_600;

/// FILETIME ticks per second.
const TICKS_PER_SECOND: u64 = 10_000_000;

/// One file in the content manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutEntry {
    pub path: String,
    pub size: u64,
    pub date: u64,
}

#[derive(Serialize)]
struct LayoutFile<'a> {
    content: &'a [LayoutEntry],
}

/// What a manifest generation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSummary {
    /// Number of files listed.
    pub entries: usize,
    /// Sum of all listed file sizes.
    pub content_size: u64,
    /// Size of the written `layout.json`.
    pub layout_size: u64,
}

fn duration_ticks(d: Duration) -> u64 {
    d.as_secs() * TICKS_PER_SECOND + u64::from(d.subsec_nanos()) / 100
}

/// Convert a modification time to 100-nanosecond ticks since 1601-01-01.
pub fn filetime_ticks(time: SystemTime) -> u64 {
    let epoch_ticks = FILETIME_EPOCH_OFFSET_SECS * TICKS_PER_SECOND;
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => epoch_ticks + duration_ticks(since),
        Err(e) => epoch_ticks.saturating_sub(duration_ticks(e.duration())),
    }
}

fn is_excluded_file(relative: &str, name: &str) -> bool {
    let lower = relative.to_ascii_lowercase();
    lower == LAYOUT_FILE
        || lower == DESCRIPTOR_FILE
        || name.starts_with('.')
        || name.eq_ignore_ascii_case("thumbs.db")
}

/// Collect manifest entries for a package root, sorted by path.
pub fn collect_entries(package_root: &Path) -> Vec<LayoutEntry> {
    let walker = WalkDir::new(package_root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir() && e.file_name().to_string_lossy().starts_with(SCRATCH_PREFIX))
        });

    let mut entries = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry in layout scan");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(package_root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let name = entry.file_name().to_string_lossy();
        if is_excluded_file(&relative, &name) {
            continue;
        }

        match entry.metadata() {
            Ok(meta) => {
                let date = meta.modified().map(filetime_ticks).unwrap_or_else(|e| {
                    warn!(path = %relative, error = %e, "No modification time, using now");
                    filetime_ticks(SystemTime::now())
                });
                entries.push(LayoutEntry {
                    path: relative,
                    size: meta.len(),
                    date,
                });
            }
            Err(e) => warn!(path = %relative, error = %e, "Skipping file in layout scan"),
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

/// Write `layout.json` for the package root.
pub fn generate_layout(package_root: &Path) -> LiveryResult<LayoutSummary> {
    let layout_path = package_root.join(LAYOUT_FILE);
    let failed = |reason: String| LiveryError::ManifestGenerationFailed {
        path: layout_path.clone(),
        reason,
    };

    let entries = collect_entries(package_root);
    let content_size: u64 = entries.iter().map(|e| e.size).sum();
    debug!(files = entries.len(), content_size, "Layout scan complete");

    let bytes =
        to_json_bytes(&LayoutFile { content: &entries }).map_err(|e| failed(e.to_string()))?;
    fs::write(&layout_path, &bytes).map_err(|e| failed(e.to_string()))?;

    let summary = LayoutSummary {
        entries: entries.len(),
        content_size,
        layout_size: bytes.len() as u64,
    };
    info!(
        files = summary.entries,
        content_size = summary.content_size,
        "Generated {}",
        LAYOUT_FILE
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    #[test]
    fn test_filetime_ticks() {
        assert_eq!(filetime_ticks(UNIX_EPOCH), 116_444_736_000_000_000);
        assert_eq!(
            filetime_ticks(UNIX_EPOCH + Duration::new(1, 500)),
            116_444_736_010_000_005
        );
        assert_eq!(
            filetime_ticks(UNIX_EPOCH - Duration::from_secs(1)),
            116_444_735_990_000_000
        );
    }

    #[test]
    fn test_generate_layout() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let livery = root.join("SimObjects/Airplanes/PMDG 777F X/texture.X");
        fs::create_dir_all(&livery).unwrap();
        fs::create_dir_all(root.join("__temp_archive_x/texture.Y")).unwrap();
        fs::write(livery.join("a.dds"), "12345").unwrap();
        fs::write(livery.join("Thumbs.db"), "x").unwrap();
        fs::write(livery.join(".DS_Store"), "x").unwrap();
        fs::write(root.join("__temp_archive_x/texture.Y/b.dds"), "x").unwrap();
        fs::write(root.join("manifest.json"), "{}").unwrap();
        fs::write(root.join("layout.json"), "old").unwrap();
        fs::write(root.join("ContentInfo.txt"), "abc").unwrap();
        filetime::set_file_mtime(livery.join("a.dds"), FileTime::from_unix_time(0, 0)).unwrap();

        let summary = generate_layout(root).unwrap();
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.content_size, 8);
        assert_eq!(
            summary.layout_size,
            fs::metadata(root.join("layout.json")).unwrap().len()
        );

        let written: serde_json::Value =
            serde_json::from_slice(&fs::read(root.join("layout.json")).unwrap()).unwrap();
        let content = written["content"].as_array().unwrap();
        assert_eq!(content[0]["path"], "ContentInfo.txt");
        assert_eq!(content[1]["path"], "SimObjects/Airplanes/PMDG 777F X/texture.X/a.dds");
        assert_eq!(content[1]["size"], 5);
        assert_eq!(content[1]["date"], 116_444_736_000_000_000u64);
    }

    #[test]
    fn test_layout_uses_four_space_indent() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();

        generate_layout(temp.path()).unwrap();
        let text = fs::read_to_string(temp.path().join("layout.json")).unwrap();
        assert!(text.starts_with("{\n    \"content\": [\n        {\n            \"path\": \"a.txt\""));
    }
}
