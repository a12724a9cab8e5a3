//! Multi-livery PTP packages.
//!
//! A converted PTP may itself be a container: its `Settings.dat` then
//! declares `Type = "multi livery"`, a `Count`, and one `[Livery N]` section
//! per bundled sub-package with its `Filename` and display `Name`.
//!
//! ```text
//! Type = "multi livery"
//! Count = 2
//!
//! [Livery 1]
//! Filename = "N501DN.ptp"
//! Name = "Delta N501DN"
//! ```

use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption, Properties};
use tracing::{debug, warn};

use crate::archive::validate_entry_name;
use crate::error::{LiveryError, LiveryResult};
use crate::fs_ops::{find_child_ci, read_text_lossy};

const SETTINGS_FILE: &str = "Settings.dat";
const MULTI_LIVERY_TYPE: &str = "multi livery";

/// One declared sub-livery of a multi-livery package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackEntry {
    /// 1-based position in the manifest.
    pub index: usize,
    /// Path to the sub-package inside the converted content.
    pub archive: PathBuf,
    /// Display name declared by the manifest.
    pub name: Option<String>,
}

fn get_ci<'a>(props: &'a Properties, key: &str) -> Option<&'a str> {
    props
        .iter()
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim().trim_matches('"').trim())
}

fn section_ci<'a>(ini: &'a Ini, name: &str) -> Option<&'a Properties> {
    ini.iter()
        .find(|(section, _)| {
            section
                .map(|s| s.trim().eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .map(|(_, props)| props)
}

fn first_value<'a>(ini: &'a Ini, key: &str) -> Option<&'a str> {
    section_ci(ini, "Settings")
        .and_then(|props| get_ci(props, key))
        .or_else(|| ini.iter().find_map(|(_, props)| get_ci(props, key)))
}

/// Parse `Settings.dat` text, supplying the implicit `[Settings]` header.
fn parse_settings(text: &str) -> Option<Ini> {
    let first_line = text
        .lines()
        .map(|l| l.trim().trim_start_matches('\u{feff}'))
        .find(|l| !l.is_empty() && !l.starts_with(';') && !l.starts_with('#'));
    let text = match first_line {
        Some(line) if line.starts_with('[') => text.to_string(),
        _ => format!("[Settings]\n{}", text),
    };

    let options = ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    };
    match Ini::load_from_str_opt(&text, options) {
        Ok(ini) => Some(ini),
        Err(e) => {
            warn!(error = %e, "Could not parse {}", SETTINGS_FILE);
            None
        }
    }
}

/// Read the multi-livery manifest of a converted PTP.
///
/// Returns `Ok(None)` when `dir` is an ordinary single livery. Each declared
/// entry is either resolved to an existing sub-package or reported as a
/// per-entry error message so siblings can still be installed.
pub fn read_multi_livery_pack(
    dir: &Path,
) -> LiveryResult<Option<Vec<Result<PackEntry, String>>>> {
    let Some(settings) = find_child_ci(dir, SETTINGS_FILE) else {
        return Ok(None);
    };
    let (text, _) = read_text_lossy(&settings)?;
    let Some(ini) = parse_settings(&text) else {
        return Ok(None);
    };

    let is_multi = first_value(&ini, "Type")
        .map(|t| t.eq_ignore_ascii_case(MULTI_LIVERY_TYPE))
        .unwrap_or(false);
    if !is_multi {
        return Ok(None);
    }

    let count_text = first_value(&ini, "Count").unwrap_or("");
    let count: usize = count_text
        .parse()
        .map_err(|_| LiveryError::StagedContentIncomplete {
            path: settings.clone(),
            reason: format!("invalid livery count '{}'", count_text),
        })?;
    debug!(count, "Found multi-livery package");

    let entries: Vec<Result<PackEntry, String>> = (1..=count)
        .map(|index| -> Result<PackEntry, String> {
            let section = format!("Livery {}", index);
            let props = section_ci(&ini, &section)
                .ok_or_else(|| format!("section [{}] missing from {}", section, SETTINGS_FILE))?;
            let filename = get_ci(props, "Filename")
                .filter(|f| !f.is_empty())
                .ok_or_else(|| format!("no Filename in [{}]", section))?;
            validate_entry_name(filename)
                .map_err(|reason| format!("sub-package '{}' rejected: {}", filename, reason))?;
            let archive = dir.join(filename.replace('\\', "/"));
            if !archive.is_file() {
                return Err(format!("sub-package '{}' not found", filename));
            }
            let name = get_ci(props, "Name")
                .filter(|n| !n.is_empty())
                .map(str::to_string);
            Ok(PackEntry {
                index,
                archive,
                name,
            })
        })
        .collect();

    Ok(Some(entries))
}
