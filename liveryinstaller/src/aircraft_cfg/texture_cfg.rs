//! Texture fallback chains in `texture.cfg`.
//!
//! Liveries from one multi-livery package usually share most of their
//! textures. Later liveries point at the first one's texture directory
//! through `fallback.N` keys so the shared files only need to exist once.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::document::{CfgDocument, Line};
use crate::error::{LiveryError, LiveryResult};
use crate::fs_ops::{find_child_ci, read_text_lossy};

/// Texture configuration file name inside a texture directory.
pub const TEXTURE_CFG: &str = "texture.cfg";

const FLTSIM_SECTION: &str = "fltsim";
const FALLBACK_PREFIX: &str = "fallback.";

/// Fallback value pointing from one installed livery's texture directory to
/// a sibling livery's texture directory.
pub fn sibling_fallback(livery_folder: &str, texture_dir: &str) -> String {
    format!("..\\..\\{}\\{}", livery_folder, texture_dir)
}

fn fallback_index(line: &Line) -> Option<u32> {
    line.key()?.strip_prefix(FALLBACK_PREFIX)?.parse().ok()
}

fn raw_value(line: &Line) -> String {
    line.trimmed()
        .split_once('=')
        .map(|(_, v)| v.trim().to_string())
        .unwrap_or_default()
}

/// Insert `fallback` as the first entry of the `[fltsim]` fallback chain.
///
/// Existing entries move down one position. Returns `None` when the chain
/// already holds the same fallback.
pub fn add_fallback_to_text(text: &str, fallback: &str) -> Option<String> {
    let mut doc = CfgDocument::parse(text);
    let eol = doc.eol();
    let entry = format!("{}1={}", FALLBACK_PREFIX, fallback);

    let Some(index) = doc.position(FLTSIM_SECTION) else {
        let section = doc.build_section("[fltsim]", &[&entry]);
        doc.insert_section(0, section);
        return Some(doc.serialize());
    };

    let section = &mut doc.sections[index];
    let exists = section.lines.iter().any(|l| {
        fallback_index(l).is_some()
            && l.value()
                .map(|v| v.eq_ignore_ascii_case(fallback))
                .unwrap_or(false)
    });
    if exists {
        return None;
    }

    for line in section.lines.iter_mut() {
        if let Some(n) = fallback_index(line) {
            let value = raw_value(line);
            line.set_content(&format!("{}{}={}", FALLBACK_PREFIX, n + 1, value));
        }
    }
    section.lines.insert(0, Line::new(entry, eol));
    Some(doc.serialize())
}

/// Add a fallback to a `texture.cfg` file, creating the file when missing.
pub fn add_texture_fallback(texture_cfg: &Path, fallback: &str) -> LiveryResult<bool> {
    let text = if texture_cfg.exists() {
        read_text_lossy(texture_cfg)?.0
    } else {
        String::new()
    };

    let Some(updated) = add_fallback_to_text(&text, fallback) else {
        debug!(path = %texture_cfg.display(), fallback, "Fallback already present");
        return Ok(false);
    };

    fs::write(texture_cfg, updated).map_err(|e| LiveryError::WriteFailed {
        path: texture_cfg.to_path_buf(),
        source: e,
    })?;
    debug!(path = %texture_cfg.display(), fallback, "Added texture fallback");
    Ok(true)
}

/// Add a fallback to the `texture.cfg` of a texture directory.
pub fn add_fallback_to_texture_dir(texture_dir: &Path, fallback: &str) -> LiveryResult<bool> {
    let path = find_child_ci(texture_dir, TEXTURE_CFG)
        .unwrap_or_else(|| texture_dir.join(TEXTURE_CFG));
    add_texture_fallback(&path, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sibling_fallback() {
        assert_eq!(
            sibling_fallback("PMDG 777-300ER Delta", "texture.DL"),
            "..\\..\\PMDG 777-300ER Delta\\texture.DL"
        );
    }

    #[test]
    fn test_shifts_existing_entries() {
        let text = "[fltsim]\r\nfallback.1=..\\..\\..\\texture\r\nfallback.2=..\\..\\..\\texture\\DETAIL\r\n";
        let out = add_fallback_to_text(text, "..\\..\\A\\texture.A").unwrap();
        assert_eq!(
            out,
            "[fltsim]\r\nfallback.1=..\\..\\A\\texture.A\r\nfallback.2=..\\..\\..\\texture\r\nfallback.3=..\\..\\..\\texture\\DETAIL\r\n"
        );
    }

    #[test]
    fn test_existing_fallback_is_kept() {
        let text = "[fltsim]\nfallback.1=..\\..\\A\\texture.A\n";
        assert!(add_fallback_to_text(text, "..\\..\\a\\TEXTURE.A").is_none());
    }

    #[test]
    fn test_creates_missing_section() {
        let out = add_fallback_to_text("[other]\nx=1\n", "..\\..\\A\\texture").unwrap();
        assert_eq!(out, "[fltsim]\nfallback.1=..\\..\\A\\texture\n\n[other]\nx=1\n");
    }

    #[test]
    fn test_file_created_when_missing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("texture.B");
        fs::create_dir(&dir).unwrap();

        assert!(add_fallback_to_texture_dir(&dir, "..\\..\\A\\texture.A").unwrap());
        let written = fs::read_to_string(dir.join(TEXTURE_CFG)).unwrap();
        assert_eq!(written, "[fltsim]\nfallback.1=..\\..\\A\\texture.A\n");

        assert!(!add_fallback_to_texture_dir(&dir, "..\\..\\A\\texture.A").unwrap());
    }
}
