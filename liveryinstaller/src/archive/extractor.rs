//! ZIP extraction with entry path validation.
//!
//! Every entry name is checked before anything is written: absolute paths,
//! drive prefixes and `..` segments abort the whole extraction. Names long
//! enough to trip platform path limits only produce a warning, but a
//! "name too long" error from the filesystem is reported as
//! [`LiveryError::PathTooLong`] so the operator gets a useful hint.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use super::traits::ArchiveExtractor;
use crate::error::{LiveryError, LiveryResult};
use crate::fs_ops::dir_has_entries;

/// Entry names longer than this are likely to exceed path limits once
/// joined onto the community folder.
pub const LONG_ENTRY_WARN_LEN: usize = 240;

/// Check that an archive entry name stays inside the extraction directory.
///
/// Returns a short reason when the name is unsafe.
pub fn validate_entry_name(name: &str) -> Result<(), &'static str> {
    if name.starts_with('/') || name.starts_with('\\') {
        return Err("absolute path");
    }

    let mut chars = name.chars();
    if let (Some(first), Some(':')) = (chars.next(), chars.next()) {
        if first.is_ascii_alphabetic() {
            return Err("drive prefix");
        }
    }

    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Err("parent directory traversal");
    }

    Ok(())
}

/// In-process ZIP extractor.
#[derive(Debug, Default)]
pub struct ZipExtractor;

impl ZipExtractor {
    /// Create a new ZIP extractor.
    pub fn new() -> Self {
        Self
    }

    fn open(&self, archive: &Path) -> LiveryResult<ZipArchive<File>> {
        let file = File::open(archive).map_err(|e| LiveryError::ReadFailed {
            path: archive.to_path_buf(),
            source: e,
        })?;
        ZipArchive::new(file).map_err(|e| LiveryError::ArchiveCorrupt {
            path: archive.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read all entry names and reject the archive if any is unsafe.
    fn validated_names(
        &self,
        archive: &Path,
        zip: &mut ZipArchive<File>,
    ) -> LiveryResult<Vec<String>> {
        let mut names = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let entry = zip.by_index(i).map_err(|e| LiveryError::ArchiveCorrupt {
                path: archive.to_path_buf(),
                reason: format!("failed to read entry {}: {}", i, e),
            })?;
            let name = entry.name().to_string();

            if let Err(reason) = validate_entry_name(&name) {
                warn!(archive = %archive.display(), entry = %name, reason, "Rejecting unsafe archive entry");
                return Err(LiveryError::UnsafeArchiveEntry {
                    archive: archive.to_path_buf(),
                    entry: name,
                });
            }
            if name.len() > LONG_ENTRY_WARN_LEN {
                warn!(
                    archive = %archive.display(),
                    entry = %name,
                    length = name.len(),
                    "Archive entry name is very long and may exceed path limits"
                );
            }
            names.push(name);
        }
        Ok(names)
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest_dir: &Path) -> LiveryResult<usize> {
        if dest_dir.exists() && dir_has_entries(dest_dir) {
            return Err(LiveryError::StagingNotEmpty(dest_dir.to_path_buf()));
        }

        let mut zip = self.open(archive)?;
        let names = self.validated_names(archive, &mut zip)?;

        fs::create_dir_all(dest_dir).map_err(|e| LiveryError::CreateDirFailed {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        let mut count = 0;
        for (i, name) in names.iter().enumerate() {
            let mut entry = zip.by_index(i).map_err(|e| LiveryError::ArchiveCorrupt {
                path: archive.to_path_buf(),
                reason: format!("failed to read entry {}: {}", name, e),
            })?;

            let relative = entry
                .enclosed_name()
                .ok_or_else(|| LiveryError::UnsafeArchiveEntry {
                    archive: archive.to_path_buf(),
                    entry: name.clone(),
                })?;
            let output_path = dest_dir.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&output_path)
                    .map_err(|e| LiveryError::write_failed(&output_path, e))?;
                continue;
            }

            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent).map_err(|e| LiveryError::write_failed(parent, e))?;
            }
            let mut outfile =
                File::create(&output_path).map_err(|e| LiveryError::write_failed(&output_path, e))?;
            io::copy(&mut entry, &mut outfile).map_err(|e| {
                if e.kind() == io::ErrorKind::InvalidData {
                    LiveryError::ArchiveCorrupt {
                        path: archive.to_path_buf(),
                        reason: format!("entry {}: {}", name, e),
                    }
                } else {
                    LiveryError::write_failed(&output_path, e)
                }
            })?;
            count += 1;
        }

        debug!(archive = %archive.display(), files = count, "Extracted archive");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    fn create_test_zip(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
        let zip_path = dir.join(name);
        let file = File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for (entry_name, content) in files {
            writer.start_file(entry_name.to_string(), options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
        zip_path
    }

    fn relative_files(root: &Path) -> BTreeSet<String> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_validate_entry_name() {
        assert!(validate_entry_name("texture.ABC/texture.cfg").is_ok());
        assert!(validate_entry_name("a..b/file..txt").is_ok());
        assert_eq!(validate_entry_name("/etc/passwd"), Err("absolute path"));
        assert_eq!(validate_entry_name("\\windows\\x"), Err("absolute path"));
        assert_eq!(validate_entry_name("C:/x.txt"), Err("drive prefix"));
        assert_eq!(
            validate_entry_name("texture/../../evil.dll"),
            Err("parent directory traversal")
        );
        assert_eq!(
            validate_entry_name("..\\evil.dll"),
            Err("parent directory traversal")
        );
    }

    #[test]
    fn test_extract_round_trips_entry_set() {
        let temp = TempDir::new().unwrap();
        let files: &[(&str, &[u8])] = &[
            ("aircraft.cfg", b"[VERSION]\nmajor=1\n"),
            ("model/model.cfg", b"[models]\n"),
            ("texture.N501DN/texture.cfg", b"[fltsim]\n"),
            ("texture.N501DN/body.dds", b"DDS "),
        ];
        let archive = create_test_zip(temp.path(), "livery.zip", files);
        let dest = temp.path().join("out");

        let count = ZipExtractor::new().extract(&archive, &dest).unwrap();

        assert_eq!(count, 4);
        let expected: BTreeSet<String> = files.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(relative_files(&dest), expected);
        assert_eq!(
            fs::read(dest.join("texture.N501DN/body.dds")).unwrap(),
            b"DDS "
        );
    }

    #[test]
    fn test_extract_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let result = ZipExtractor::new().extract(&archive, &temp.path().join("out"));
        assert!(matches!(result, Err(LiveryError::ArchiveCorrupt { .. })));
    }

    #[test]
    fn test_extract_refuses_non_empty_destination() {
        let temp = TempDir::new().unwrap();
        let archive = create_test_zip(temp.path(), "a.zip", &[("aircraft.cfg", b"x")]);
        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("leftover"), "x").unwrap();

        let result = ZipExtractor::new().extract(&archive, &dest);
        assert!(matches!(result, Err(LiveryError::StagingNotEmpty(_))));
    }
}
