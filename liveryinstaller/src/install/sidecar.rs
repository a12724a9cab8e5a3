//! Per-livery settings sidecar.
//!
//! The aircraft reads livery-specific options from
//! `<state package>/work/Aircraft/<atc_id>.ini` in the simulator's
//! host-managed state tree. Liveries ship that file either as
//! `options.ini` or already named after their registration.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::aircraft_cfg::CfgDocument;
use crate::fs_ops::{find_file_recursive_ci, read_text_lossy};
use crate::staging::OPTIONS_FILE;

/// Result of relocating a livery's settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarOutcome {
    /// The file was copied to the given path.
    Copied(PathBuf),
    /// The configuration declares no usable `atc_id`.
    NoIdentifier,
    /// No settings file was shipped with the livery.
    NoSettingsFile { atc_id: String },
    /// A settings file exists but could not be copied.
    CopyFailed { file: String, reason: String },
}

impl SidecarOutcome {
    /// Note appended to an otherwise successful item result.
    pub fn qualifier(&self) -> Option<String> {
        match self {
            Self::Copied(_) => None,
            Self::NoIdentifier => Some("no atc_id, settings file skipped".to_string()),
            Self::NoSettingsFile { atc_id } => {
                Some(format!("no options.ini or {}.ini shipped", atc_id))
            }
            Self::CopyFailed { file, reason } => {
                Some(format!("warning: {} found but not copied: {}", file, reason))
            }
        }
    }
}

fn is_atc_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ' ')
}

/// Registration identifier from the first sim-object section.
///
/// Only the leading run of letters, digits, `_`, `.`, `-` and spaces counts.
pub fn atc_id_from_config(text: &str) -> Option<String> {
    let doc = CfgDocument::parse(text);
    let section = doc.sections.iter().find(|s| s.is_fltsim())?;
    let value = section.value("atc_id")?;
    let id: String = value.chars().take_while(|c| is_atc_char(*c)).collect();
    let id = id.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// File name the sidecar is stored under.
pub fn sidecar_file_name(atc_id: &str) -> String {
    format!("{}.ini", atc_id)
}

/// Copy the livery's settings file into the aircraft's state package.
///
/// `options.ini` anywhere in the content wins over a pre-named
/// `<atc_id>.ini`. Never fails; the outcome says what happened.
pub fn relocate_sidecar(content_root: &Path, config: &Path, state_dir: &Path) -> SidecarOutcome {
    let atc_id = match read_text_lossy(config) {
        Ok((text, _)) => atc_id_from_config(&text),
        Err(e) => {
            warn!(error = %e, "Could not read configuration for atc_id");
            None
        }
    };
    let Some(atc_id) = atc_id else {
        warn!("atc_id not found in aircraft.cfg; settings file not relocated");
        return SidecarOutcome::NoIdentifier;
    };

    let file_name = sidecar_file_name(&atc_id);
    let Some(source) = find_file_recursive_ci(content_root, OPTIONS_FILE)
        .or_else(|| find_file_recursive_ci(content_root, &file_name))
    else {
        debug!(atc_id = %atc_id, "No settings file shipped with livery");
        return SidecarOutcome::NoSettingsFile { atc_id };
    };

    let target_dir = state_dir.join("work").join("Aircraft");
    let target = target_dir.join(&file_name);
    let copied = fs::create_dir_all(&target_dir).and_then(|_| fs::copy(&source, &target));
    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| OPTIONS_FILE.to_string());

    match copied {
        Ok(_) => {
            info!(from = %source_name, to = %target.display(), "Copied livery settings file");
            SidecarOutcome::Copied(target)
        }
        Err(e) => {
            warn!(file = %source_name, error = %e, "Failed to copy livery settings file");
            SidecarOutcome::CopyFailed {
                file: source_name,
                reason: e.to_string(),
            }
        }
    }
}
