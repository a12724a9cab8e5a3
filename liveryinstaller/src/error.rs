//! Error types for the livery installation pipeline.
//!
//! A single [`LiveryError`] covers every failure the pipeline can report.
//! Most variants are per-item failures that the batch orchestrator records
//! and moves past; [`LiveryError::is_setup_error`] identifies the ones that
//! abort a batch before any archive is touched.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Result type for pipeline operations.
pub type LiveryResult<T> = Result<T, LiveryError>;

/// How the external converter failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolFailure {
    /// The process exited with a non-zero status.
    ExitCode(i32),
    /// The process exited cleanly but printed a known failure signature.
    OutputPattern(&'static str),
    /// The process did not finish within the allowed time and was killed.
    TimedOut(Duration),
    /// The process was terminated by a signal.
    Terminated,
    /// The process could not be started.
    LaunchFailed,
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCode(code) => write!(f, "exited with code {}", code),
            Self::OutputPattern(signature) => write!(f, "reported '{}'", signature),
            Self::TimedOut(timeout) => {
                write!(f, "timed out after {}s", timeout.as_secs())
            }
            Self::Terminated => write!(f, "was terminated by a signal"),
            Self::LaunchFailed => write!(f, "could not be started"),
        }
    }
}

/// Errors that can occur while installing liveries.
#[derive(Debug)]
pub enum LiveryError {
    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to copy a file.
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Failed to remove a file or directory.
    RemoveFailed { path: PathBuf, source: io::Error },

    /// The archive container could not be opened or read.
    ArchiveCorrupt { path: PathBuf, reason: String },

    /// An archive entry would escape the extraction directory.
    UnsafeArchiveEntry { archive: PathBuf, entry: String },

    /// The filesystem rejected a path as too long.
    PathTooLong { path: PathBuf, source: io::Error },

    /// An extraction target already holds files.
    StagingNotEmpty(PathBuf),

    /// The external converter executable does not exist.
    ExternalToolMissing(PathBuf),

    /// The external converter ran but did not succeed.
    ExternalToolFailed {
        archive: PathBuf,
        failure: ToolFailure,
        diagnostics: String,
    },

    /// The converter reported success but produced no usable output.
    ConverterOutputMissing { archive: PathBuf, expected: PathBuf },

    /// Moving converter output into staging failed part way.
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Staged content lacks a required file or directory.
    StagedContentIncomplete { path: PathBuf, reason: String },

    /// The aircraft configuration could not be rewritten.
    ConfigRewriteFailed { path: PathBuf, reason: String },

    /// A previous install could not be removed.
    DestinationConflict { path: PathBuf, source: io::Error },

    /// The content manifest could not be generated.
    ManifestGenerationFailed { path: PathBuf, reason: String },

    /// The package descriptor could not be updated.
    DescriptorUpdateFailed { path: PathBuf, reason: String },

    /// Operator settings failed validation.
    ConfigurationInvalid(Vec<String>),
}

impl LiveryError {
    /// Whether this error aborts the whole batch rather than a single item.
    pub fn is_setup_error(&self) -> bool {
        matches!(self, Self::ConfigurationInvalid(_))
    }

    /// Whether the underlying I/O error is the platform's "name too long" condition.
    pub(crate) fn is_name_too_long(err: &io::Error) -> bool {
        // ENAMETOOLONG on Unix, ERROR_FILENAME_EXCED_RANGE on Windows
        let code = if cfg!(windows) { 206 } else { 36 };
        err.raw_os_error() == Some(code)
    }

    /// Wrap a write-side I/O error, singling out over-long paths.
    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if Self::is_name_too_long(&source) {
            Self::PathTooLong { path, source }
        } else {
            Self::WriteFailed { path, source }
        }
    }
}

impl fmt::Display for LiveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::CopyFailed { from, to, source } => {
                write!(
                    f,
                    "failed to copy {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::RemoveFailed { path, source } => {
                write!(f, "failed to remove {}: {}", path.display(), source)
            }
            Self::ArchiveCorrupt { path, reason } => {
                write!(f, "invalid or corrupt archive {}: {}", path.display(), reason)
            }
            Self::UnsafeArchiveEntry { archive, entry } => {
                write!(
                    f,
                    "unsafe entry '{}' in archive {}",
                    entry,
                    archive.display()
                )
            }
            Self::PathTooLong { path, .. } => {
                write!(
                    f,
                    "path too long: {} (move the archive closer to the drive root or shorten the community folder path)",
                    path.display()
                )
            }
            Self::StagingNotEmpty(path) => {
                write!(f, "extraction directory is not empty: {}", path.display())
            }
            Self::ExternalToolMissing(path) => {
                write!(f, "converter not found: {}", path.display())
            }
            Self::ExternalToolFailed {
                archive,
                failure,
                diagnostics,
            } => {
                write!(f, "converter {} for {}", failure, archive.display())?;
                if !diagnostics.is_empty() {
                    write!(f, ": {}", diagnostics)?;
                }
                Ok(())
            }
            Self::ConverterOutputMissing { archive, expected } => {
                write!(
                    f,
                    "converter produced no content for {} (expected {})",
                    archive.display(),
                    expected.display()
                )
            }
            Self::MoveFailed { from, to, source } => {
                write!(
                    f,
                    "failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::StagedContentIncomplete { path, reason } => {
                write!(f, "incomplete livery content in {}: {}", path.display(), reason)
            }
            Self::ConfigRewriteFailed { path, reason } => {
                write!(f, "failed to rewrite {}: {}", path.display(), reason)
            }
            Self::DestinationConflict { path, source } => {
                write!(
                    f,
                    "cannot replace existing livery {}: {} (is the simulator running?)",
                    path.display(),
                    source
                )
            }
            Self::ManifestGenerationFailed { path, reason } => {
                write!(
                    f,
                    "failed to generate content manifest {}: {}",
                    path.display(),
                    reason
                )
            }
            Self::DescriptorUpdateFailed { path, reason } => {
                write!(
                    f,
                    "failed to update package descriptor {}: {}",
                    path.display(),
                    reason
                )
            }
            Self::ConfigurationInvalid(issues) => {
                write!(f, "invalid settings: {}", issues.join("; "))
            }
        }
    }
}

impl std::error::Error for LiveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            Self::CopyFailed { source, .. } => Some(source),
            Self::RemoveFailed { source, .. } => Some(source),
            Self::PathTooLong { source, .. } => Some(source),
            Self::MoveFailed { source, .. } => Some(source),
            Self::DestinationConflict { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LiveryError::UnsafeArchiveEntry {
            archive: PathBuf::from("pack.zip"),
            entry: "../evil.txt".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsafe entry '../evil.txt' in archive pack.zip"
        );
    }

    #[test]
    fn test_tool_failure_display() {
        let err = LiveryError::ExternalToolFailed {
            archive: PathBuf::from("a.ptp"),
            failure: ToolFailure::ExitCode(3),
            diagnostics: "stderr: boom".to_string(),
        };
        assert!(err.to_string().contains("exited with code 3"));
        assert!(err.to_string().contains("boom"));

        let timeout = ToolFailure::TimedOut(Duration::from_secs(300));
        assert_eq!(timeout.to_string(), "timed out after 300s");
    }

    #[test]
    fn test_destination_conflict_hints_at_simulator() {
        let err = LiveryError::DestinationConflict {
            path: PathBuf::from("x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("simulator running"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_setup_error_classification() {
        assert!(LiveryError::ConfigurationInvalid(vec!["x".into()]).is_setup_error());
        assert!(!LiveryError::StagingNotEmpty(PathBuf::from("x")).is_setup_error());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failed_detects_name_too_long() {
        let err = LiveryError::write_failed("x", io::Error::from_raw_os_error(36));
        assert!(matches!(err, LiveryError::PathTooLong { .. }));

        let err = LiveryError::write_failed("x", io::Error::from_raw_os_error(13));
        assert!(matches!(err, LiveryError::WriteFailed { .. }));
    }
}
