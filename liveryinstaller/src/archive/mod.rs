//! Archive ingestion.
//!
//! Livery archives arrive in two formats:
//!
//! - **ZIP** containers, extracted in-process by [`ZipExtractor`]
//! - **PTP** packages, a proprietary format that only an external converter
//!   executable can unpack; [`PtpConverter`] drives that process
//!
//! Both produce a staged directory that the staging module then normalizes.
//! The two stages sit behind the [`ArchiveExtractor`] and [`ArchiveConverter`]
//! traits so the batch orchestrator can be exercised without real archives
//! or the converter binary.

mod converter;
mod extractor;
mod traits;

pub use converter::{assess_tool_output, PtpConverter, DEFAULT_CONVERTER_TIMEOUT};
pub use extractor::{validate_entry_name, ZipExtractor, LONG_ENTRY_WARN_LEN};
pub use traits::{ArchiveConverter, ArchiveExtractor};

use std::path::{Path, PathBuf};

/// Declared format of an input archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Standard ZIP container.
    Zip,
    /// Proprietary PTP package, converted out of process.
    Ptp,
}

impl ArchiveKind {
    /// Determine the kind from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "zip" => Some(Self::Zip),
            "ptp" => Some(Self::Ptp),
            _ => None,
        }
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Ptp => "ptp",
        }
    }
}

/// An archive selected for installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputArchive {
    pub path: PathBuf,
    pub kind: ArchiveKind,
}

impl InputArchive {
    /// Create an input archive, inferring its kind from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = ArchiveKind::from_path(&path)?;
        Some(Self { path, kind })
    }

    /// File name for display purposes.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_path() {
        assert_eq!(
            ArchiveKind::from_path(Path::new("a/Livery.ZIP")),
            Some(ArchiveKind::Zip)
        );
        assert_eq!(
            ArchiveKind::from_path(Path::new("b.ptp")),
            Some(ArchiveKind::Ptp)
        );
        assert_eq!(ArchiveKind::from_path(Path::new("c.rar")), None);
        assert_eq!(ArchiveKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_input_archive_display_name() {
        let input = InputArchive::from_path("/tmp/x/Delta N501DN.zip").unwrap();
        assert_eq!(input.kind, ArchiveKind::Zip);
        assert_eq!(input.display_name(), "Delta N501DN.zip");
    }
}
