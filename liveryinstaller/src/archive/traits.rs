//! Seams between the orchestrator and the archive back ends.

use std::path::{Path, PathBuf};

use crate::error::LiveryResult;

/// Extracts a container archive into a directory.
pub trait ArchiveExtractor: Send + Sync {
    /// Extract `archive` into `dest_dir`, returning the number of files written.
    ///
    /// `dest_dir` must not exist or must be empty. On error the caller owns
    /// cleanup of whatever was written.
    fn extract(&self, archive: &Path, dest_dir: &Path) -> LiveryResult<usize>;
}

/// Converts a proprietary archive into a staged directory.
pub trait ArchiveConverter: Send + Sync {
    /// Convert `archive`, placing its content in a new directory under
    /// `staging_base`. Returns the staged directory.
    fn convert(&self, archive: &Path, staging_base: &Path) -> LiveryResult<PathBuf>;
}
