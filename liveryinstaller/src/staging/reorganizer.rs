//! Normalizes staged livery content into the canonical layout.
//!
//! The canonical layout has a single `aircraft.cfg` next to the model and
//! texture directories. Authors ship many variations: PTP conversions carry
//! a `Config.cfg` and a loose `model.cfg`, ZIPs often nest everything a few
//! folders deep, and headers are numbered however the author liked.
//!
//! Only a missing or empty configuration file is fatal; every other step
//! logs a warning and carries on.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{LiveryError, LiveryResult};
use crate::fs_ops::{find_child_ci, find_file_recursive_ci, is_ignored_entry, read_text_lossy};

/// Canonical configuration file name.
pub const CONFIG_FILE: &str = "aircraft.cfg";

/// Configuration file name used by converted PTP packages.
pub const ALT_CONFIG_FILE: &str = "Config.cfg";

/// Canonical auxiliary settings file name.
pub const OPTIONS_FILE: &str = "options.ini";

const LEGACY_OPTIONS_FILE: &str = "Aircraft.ini";
const MODEL_FILE: &str = "model.cfg";
const TRANSIENT_FILES: [&str; 3] = ["Settings.dat", "Manifest.ini", "Product.ini"];

static FLTSIM_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^(\x{FEFF}?[ \t]*)\[{1,2}[ \t]*fltsim\.[0-9]+[ \t]*\]{1,2}[^\r\n]*")
        .expect("valid regex")
});

static MODEL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?im)^[ \t]*model[ \t]*=[ \t]*"?([^"\r\n]*?)"?[ \t]*\r?$"#).expect("valid regex")
});

/// Livery content in the canonical layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalContent {
    /// Directory holding the configuration file.
    pub root: PathBuf,
    /// Path to the canonical `aircraft.cfg`.
    pub config: PathBuf,
}

impl CanonicalContent {
    /// Model directories (`model`, `model.<suffix>`) directly under the root.
    pub fn model_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(&self.root)
            .into_iter()
            .flatten()
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .to_ascii_lowercase()
                    .starts_with("model")
            })
            .map(|e| e.path())
            .collect();
        dirs.sort();
        dirs
    }

    /// Texture directories anywhere under the root.
    ///
    /// The walk does not descend into a texture directory once found.
    pub fn texture_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        let mut walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_ignored_entry(&name) {
                walker.skip_current_dir();
                continue;
            }
            if is_texture_dir_name(&name) {
                walker.skip_current_dir();
                dirs.push(entry.into_path());
            }
        }
        dirs
    }
}

/// Whether a directory name follows the `texture.<name>` convention.
pub fn is_texture_dir_name(name: &str) -> bool {
    name.to_ascii_lowercase().starts_with("texture.")
}

/// Find the directory that holds the livery's configuration file.
///
/// Prefers the staged root itself; otherwise the shallowest directory with an
/// `aircraft.cfg` (or, failing that, a `Config.cfg`).
pub fn locate_content_root(staged: &Path) -> Option<PathBuf> {
    if find_child_ci(staged, ALT_CONFIG_FILE).is_some()
        || find_child_ci(staged, CONFIG_FILE).is_some()
    {
        return Some(staged.to_path_buf());
    }

    find_file_recursive_ci(staged, CONFIG_FILE)
        .or_else(|| find_file_recursive_ci(staged, ALT_CONFIG_FILE))
        .and_then(|cfg| cfg.parent().map(Path::to_path_buf))
}

/// Line ending used by `text`.
pub(crate) fn detect_eol(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Model directory name declared by a `model=` key.
pub fn model_dir_name(config_text: &str) -> String {
    match MODEL_KEY.captures(config_text) {
        Some(caps) => {
            let suffix = caps[1].trim();
            if suffix.is_empty() {
                "model".to_string()
            } else {
                format!("model.{}", suffix)
            }
        }
        None => "model".to_string(),
    }
}

/// Rewrite every `[fltsim.N]` header to `[fltsim.0]`.
///
/// When the text has no such header at all, one is prepended. Returns the
/// new text and the number of headers that changed.
pub fn normalize_fltsim_headers(text: &str, eol: &str) -> (String, usize) {
    let mut changed = 0;
    let mut found = false;
    let rewritten = FLTSIM_HEADER.replace_all(text, |caps: &regex::Captures| {
        found = true;
        let whole = &caps[0];
        let replacement = format!("{}[fltsim.0]", &caps[1]);
        if whole != replacement {
            changed += 1;
        }
        replacement
    });

    if found {
        (rewritten.into_owned(), changed)
    } else {
        let (bom, body) = split_bom(text);
        (format!("{}[fltsim.0]{}{}", bom, eol, body), 1)
    }
}

/// Prepend a `[VERSION]` section unless the text already starts with one.
pub fn ensure_version_header(text: &str, eol: &str) -> (String, bool) {
    let (bom, body) = split_bom(text);
    if body
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("[version]")
    {
        return (text.to_string(), false);
    }
    let header = format!("[VERSION]{eol}major=1{eol}minor=0{eol}{eol}", eol = eol);
    (format!("{}{}{}", bom, header, body), true)
}

fn split_bom(text: &str) -> (&str, &str) {
    match text.strip_prefix('\u{feff}') {
        Some(body) => ("\u{feff}", body),
        None => ("", text),
    }
}

/// Write the normalized text under the canonical name and drop the source.
///
/// Returns the path that holds the configuration afterwards.
fn write_canonical_config(root: &Path, source: &Path, text: &str, same_name: bool) -> PathBuf {
    let config = root.join(CONFIG_FILE);
    if same_name && source != config {
        // Only the case differs; remove first so the canonical name sticks.
        if let Err(e) = fs::remove_file(source) {
            warn!(path = %source.display(), error = %e, "Could not remove original config");
        }
    }

    match fs::write(&config, text) {
        Ok(()) => {
            if !same_name {
                if let Err(e) = fs::remove_file(source) {
                    warn!(path = %source.display(), error = %e, "Could not remove original config");
                }
            }
            config
        }
        Err(e) => {
            warn!(path = %config.display(), error = %e, "Could not write canonical config");
            if source.exists() {
                source.to_path_buf()
            } else {
                config
            }
        }
    }
}

/// Normalize a staged directory into canonical livery content.
pub fn reorganize(staged: &Path) -> LiveryResult<CanonicalContent> {
    let root = locate_content_root(staged).ok_or_else(|| LiveryError::StagedContentIncomplete {
        path: staged.to_path_buf(),
        reason: format!("no {} or {} found", CONFIG_FILE, ALT_CONFIG_FILE),
    })?;

    // Step 1: configuration source.
    let source = find_child_ci(&root, ALT_CONFIG_FILE)
        .or_else(|| find_child_ci(&root, CONFIG_FILE))
        .ok_or_else(|| LiveryError::StagedContentIncomplete {
            path: root.clone(),
            reason: "configuration file disappeared".to_string(),
        })?;
    let (text, original_bytes) = read_text_lossy(&source)?;
    if text.trim().trim_start_matches('\u{feff}').is_empty() {
        return Err(LiveryError::StagedContentIncomplete {
            path: source,
            reason: "configuration file is empty".to_string(),
        });
    }
    let eol = detect_eol(&text);

    // Step 2: loose model.cfg.
    if let Some(model_file) = find_child_ci(&root, MODEL_FILE) {
        let model_dir = root.join(model_dir_name(&text));
        let moved = fs::create_dir_all(&model_dir)
            .and_then(|_| fs::rename(&model_file, model_dir.join(MODEL_FILE)));
        match moved {
            Ok(()) => debug!(dir = %model_dir.display(), "Moved model.cfg into model directory"),
            Err(e) => warn!(error = %e, "Could not move model.cfg into its model directory"),
        }
    }

    // Steps 3 and 4: headers.
    let (text, renumbered) = normalize_fltsim_headers(&text, eol);
    if renumbered > 0 {
        debug!(count = renumbered, "Normalized fltsim headers");
    }
    let (text, added_version) = ensure_version_header(&text, eol);
    if added_version {
        debug!("Prepended [VERSION] section");
    }

    // Step 5: canonical file.
    let is_canonical_name = source
        .file_name()
        .map(|n| n.to_string_lossy().eq_ignore_ascii_case(CONFIG_FILE))
        .unwrap_or(false);
    let config = if is_canonical_name && text.as_bytes() == original_bytes.as_slice() {
        source
    } else {
        write_canonical_config(&root, &source, &text, is_canonical_name)
    };

    // Step 6: auxiliary renames and deletions.
    if let Some(legacy) = find_child_ci(&root, LEGACY_OPTIONS_FILE) {
        let options = root.join(OPTIONS_FILE);
        if let Some(existing) = find_child_ci(&root, OPTIONS_FILE) {
            if let Err(e) = fs::remove_file(&existing) {
                warn!(path = %existing.display(), error = %e, "Could not replace {}", OPTIONS_FILE);
            }
        }
        if let Err(e) = fs::rename(&legacy, &options) {
            warn!(error = %e, "Could not rename {} to {}", LEGACY_OPTIONS_FILE, OPTIONS_FILE);
        }
    }
    for name in TRANSIENT_FILES {
        if let Some(path) = find_child_ci(&root, name) {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Could not delete transient file");
            }
        }
    }

    info!(root = %root.display(), "Livery content reorganized");
    Ok(CanonicalContent { root, config })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_model_dir_name() {
        assert_eq!(model_dir_name("[fltsim.0]\nmodel=\"\"\n"), "model");
        assert_eq!(model_dir_name("[fltsim.0]\nmodel = GE\n"), "model.GE");
        assert_eq!(model_dir_name("[fltsim.0]\r\nmodel=\"RR\"\r\n"), "model.RR");
        assert_eq!(model_dir_name("[fltsim.0]\ntitle=\"x\"\n"), "model");
    }

    #[test]
    fn test_normalize_fltsim_headers() {
        let (text, changed) =
            normalize_fltsim_headers("[FLTSIM.3]\ntitle=\"a\"\n  [[fltsim.12]]\n", "\n");
        assert_eq!(text, "[fltsim.0]\ntitle=\"a\"\n  [fltsim.0]\n");
        assert_eq!(changed, 2);

        let (text, changed) = normalize_fltsim_headers("[fltsim.0]\n", "\n");
        assert_eq!(text, "[fltsim.0]\n");
        assert_eq!(changed, 0);
    }

    #[test]
    fn test_normalize_header_after_bom_and_with_comment() {
        let (text, changed) =
            normalize_fltsim_headers("\u{feff}[FLTSIM.1]\ntitle=\"A\"\ntexture=X\n", "\n");
        assert_eq!(text, "\u{feff}[fltsim.0]\ntitle=\"A\"\ntexture=X\n");
        assert_eq!(changed, 1);

        let (text, changed) = normalize_fltsim_headers("[FLTSIM.1] ; primary\r\ntitle=A\r\n", "\r\n");
        assert_eq!(text, "[fltsim.0]\r\ntitle=A\r\n");
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_normalize_prepends_missing_header() {
        let (text, _) = normalize_fltsim_headers("title=\"a\"\r\n", "\r\n");
        assert_eq!(text, "[fltsim.0]\r\ntitle=\"a\"\r\n");
    }

    #[test]
    fn test_ensure_version_header() {
        let (text, added) = ensure_version_header("[fltsim.0]\n", "\n");
        assert!(added);
        assert_eq!(text, "[VERSION]\nmajor=1\nminor=0\n\n[fltsim.0]\n");

        let (text, added) = ensure_version_header("\n[Version]\nmajor=1\n", "\n");
        assert!(!added);
        assert_eq!(text, "\n[Version]\nmajor=1\n");

        let (text, added) = ensure_version_header("\u{feff}[fltsim.0]\n", "\n");
        assert!(added);
        assert!(text.starts_with("\u{feff}[VERSION]"));
    }

    #[test]
    fn test_reorganize_ptp_layout() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(
            root.join("Config.cfg"),
            "[fltsim.4]\r\ntitle=\"Test\"\r\nmodel=\"GE\"\r\n",
        )
        .unwrap();
        fs::write(root.join("model.cfg"), "[models]").unwrap();
        fs::write(root.join("Aircraft.ini"), "[x]").unwrap();
        fs::write(root.join("Settings.dat"), "Type=single").unwrap();
        fs::create_dir(root.join("texture.GE")).unwrap();

        let content = reorganize(root).unwrap();

        assert_eq!(content.root, root);
        assert!(!root.join("Config.cfg").exists());
        assert!(root.join("model.GE/model.cfg").is_file());
        assert!(root.join("options.ini").is_file());
        assert!(!root.join("Aircraft.ini").exists());
        assert!(!root.join("Settings.dat").exists());

        let cfg = fs::read_to_string(&content.config).unwrap();
        assert_eq!(
            cfg,
            "[VERSION]\r\nmajor=1\r\nminor=0\r\n\r\n[fltsim.0]\r\ntitle=\"Test\"\r\nmodel=\"GE\"\r\n"
        );
        assert_eq!(content.texture_dirs(), vec![root.join("texture.GE")]);
        assert_eq!(content.model_dirs(), vec![root.join("model.GE")]);
    }

    #[test]
    fn test_reorganize_finds_nested_config() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("SimObjects/Airplanes/My Livery");
        fs::create_dir_all(nested.join("texture.MY")).unwrap();
        fs::write(
            nested.join("aircraft.cfg"),
            "[VERSION]\nmajor=1\nminor=0\n\n[fltsim.0]\ntitle=\"x\"\n",
        )
        .unwrap();

        let content = reorganize(temp.path()).unwrap();
        assert_eq!(content.root, nested);
        assert_eq!(content.config, nested.join("aircraft.cfg"));
    }

    #[test]
    fn test_reorganize_leaves_canonical_file_untouched() {
        let temp = TempDir::new().unwrap();
        let original = "[VERSION]\nmajor=1\nminor=0\n\n[fltsim.0]\ntitle=\"x\"\n";
        fs::write(temp.path().join("aircraft.cfg"), original).unwrap();

        let content = reorganize(temp.path()).unwrap();
        assert_eq!(fs::read_to_string(content.config).unwrap(), original);
    }

    #[test]
    fn test_reorganize_missing_config_is_fatal() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("texture.A")).unwrap();

        let result = reorganize(temp.path());
        assert!(matches!(
            result,
            Err(LiveryError::StagedContentIncomplete { .. })
        ));
    }

    #[test]
    fn test_reorganize_empty_config_is_fatal() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("aircraft.cfg"), "  \n").unwrap();

        let result = reorganize(temp.path());
        assert!(matches!(
            result,
            Err(LiveryError::StagedContentIncomplete { .. })
        ));
    }

    #[test]
    fn test_texture_dirs_skip_noise() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("__MACOSX/texture.A")).unwrap();
        fs::create_dir_all(temp.path().join("texture.B/texture.inner")).unwrap();
        fs::create_dir_all(temp.path().join("extra/texture.C")).unwrap();
        let content = CanonicalContent {
            root: temp.path().to_path_buf(),
            config: temp.path().join("aircraft.cfg"),
        };

        assert_eq!(
            content.texture_dirs(),
            vec![
                temp.path().join("extra/texture.C"),
                temp.path().join("texture.B")
            ]
        );
    }
}
