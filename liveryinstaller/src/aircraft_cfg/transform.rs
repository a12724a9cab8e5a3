//! Rewrites an installed livery's `aircraft.cfg`.
//!
//! The installer owns three things in the file: the `[fltsim.0]` header, the
//! title inside it, and the `base_container` reference in `[VARIATION]` that
//! points the livery at the aircraft's base SimObject. Everything else is
//! carried through unchanged, and a file that already matches is not
//! rewritten at all.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::{debug, info};

use super::document::{CfgDocument, Line, Section};
use crate::error::{LiveryError, LiveryResult};
use crate::fs_ops::read_text_lossy;
use crate::variant::{AircraftVariant, ENGINE_CODES};

/// Indentation for lines the transformer inserts.
pub const DEFAULT_INDENT: &str = "    ";

const CANONICAL_FLTSIM_HEADER: &str = "[fltsim.0]";

/// What a transformation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    /// Whether the output differs from the input.
    pub changed: bool,
    /// The `base_container` value written, without quotes.
    pub base_container: String,
    /// Engine suffix carried over from the original reference.
    pub engine: Option<&'static str>,
}

/// Engine code following the variant's base name in a `base_container` value.
///
/// Only variants with selectable engines carry a suffix.
pub fn detect_engine_suffix(value: &str, variant: AircraftVariant) -> Option<&'static str> {
    if !variant.has_engine_options() {
        return None;
    }
    let normalized = value.replace('/', "\\");
    let pattern = format!(r"(?i){}\s+(GE|RR|PW)\b", regex::escape(&variant.base_name()));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(&normalized)?;
    let code = caps[1].to_ascii_uppercase();
    ENGINE_CODES.iter().copied().find(|c| *c == code)
}

/// `base_container` value for a variant and optional engine.
pub fn base_container_value(variant: AircraftVariant, engine: Option<&str>) -> String {
    match engine {
        Some(engine) => format!("..\\{} {}", variant.base_name(), engine),
        None => format!("..\\{}", variant.base_name()),
    }
}

fn title_line(display_name: &str) -> String {
    format!("title = \"{}\"", display_name.replace('"', "'"))
}

fn base_container_line(value: &str) -> String {
    format!("base_container = \"{}\"", value)
}

/// Set every line with one of `keys` to `content`, or insert it when absent.
fn upsert(
    section: &mut Section,
    keys: &[&str],
    content: &str,
    new_line: impl Fn(String) -> Line,
) -> bool {
    let mut found = false;
    let mut changed = false;
    for line in section.lines.iter_mut() {
        if let Some(key) = line.key() {
            if keys.contains(&key.as_str()) {
                found = true;
                changed |= line.set_content(content);
            }
        }
    }
    if !found {
        let at = section.content_end();
        section
            .lines
            .insert(at, new_line(format!("{}{}", DEFAULT_INDENT, content)));
        changed = true;
    }
    changed
}

/// Apply the installer's edits to configuration text.
///
/// Pure function: returns the new text and what changed.
pub fn transform_text(
    text: &str,
    variant: AircraftVariant,
    display_name: &str,
) -> (String, TransformOutcome) {
    let mut doc = CfgDocument::parse(text);
    let eol = doc.eol();
    let make_line = move |t: String| Line::new(t, eol);

    let engine = doc
        .position("VARIATION")
        .and_then(|i| doc.sections[i].value("base_container"))
        .and_then(|value| detect_engine_suffix(&value, variant));
    let base_container = base_container_value(variant, engine);
    let title = title_line(display_name);

    // Sim-object sections: canonical header and title.
    for section in doc.sections.iter_mut().filter(|s| s.is_fltsim()) {
        if section.header.set_content(CANONICAL_FLTSIM_HEADER) {
            debug!("Normalized sim-object section header");
        }
        if upsert(section, &["title", "ttitle"], &title, make_line) {
            debug!(title = %title, "Set livery title");
        }
    }

    // Variation sections: base container reference.
    let base_line = base_container_line(&base_container);
    for section in doc.sections.iter_mut().filter(|s| s.is_named("VARIATION")) {
        upsert(section, &["base_container"], &base_line, make_line);
    }

    if doc.position("VERSION").is_none() {
        let version = doc.build_section("[VERSION]", &["major=1", "minor=0"]);
        doc.insert_section(0, version);
    }

    if doc.position("VARIATION").is_none() {
        let variation =
            doc.build_section("[VARIATION]", &[&format!("{}{}", DEFAULT_INDENT, base_line)]);
        let at = match (doc.position("VERSION"), doc.fltsim_position()) {
            (Some(version), _) => version + 1,
            (None, Some(fltsim)) => fltsim,
            (None, None) => doc.sections.len(),
        };
        doc.insert_section(at, variation);
    }

    if doc.fltsim_position().is_none() {
        let fltsim = doc.build_section(
            CANONICAL_FLTSIM_HEADER,
            &[&format!("{}{}", DEFAULT_INDENT, title)],
        );
        let end = doc.sections.len();
        doc.insert_section(end, fltsim);
    }

    let output = doc.serialize();
    let outcome = TransformOutcome {
        changed: output != text,
        base_container,
        engine,
    };
    (output, outcome)
}

/// Transform an installed configuration file in place.
///
/// The file is only written when the result differs from what is on disk.
pub fn transform_file(
    path: &Path,
    variant: AircraftVariant,
    display_name: &str,
) -> LiveryResult<TransformOutcome> {
    let (text, bytes) = read_text_lossy(path).map_err(|e| LiveryError::ConfigRewriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let (output, mut outcome) = transform_text(&text, variant, display_name);
    outcome.changed = output.as_bytes() != bytes.as_slice();

    if outcome.changed {
        fs::write(path, output).map_err(|e| LiveryError::ConfigRewriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), base_container = %outcome.base_container, "Updated aircraft.cfg");
    } else {
        debug!(path = %path.display(), "aircraft.cfg already up to date");
    }
    Ok(outcome)
}
