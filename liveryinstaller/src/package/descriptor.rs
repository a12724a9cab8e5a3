//! Package descriptor (`manifest.json`) updates.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::info;

use super::to_json_bytes;
use crate::error::{LiveryError, LiveryResult};
use crate::variant::AircraftVariant;

/// Default `creator` field.
pub const DEFAULT_CREATOR: &str = "Livery Installer";

/// Default `minimum_game_version` field.
pub const DEFAULT_MINIMUM_GAME_VERSION: &str = "1.37.19";

const DEPENDENCY_VERSION: &str = "0.1.0";
const DEFAULT_MANUFACTURER: &str = "PMDG";
const DEFAULT_PACKAGE_VERSION: &str = "1.0.0";

/// Metadata written into the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorMetadata {
    pub dependency: String,
    pub title: String,
    pub creator: String,
    pub minimum_game_version: String,
}

impl DescriptorMetadata {
    /// Metadata for a variant's livery package with default creator fields.
    pub fn for_variant(variant: AircraftVariant) -> Self {
        Self {
            dependency: variant.dependency(),
            title: format!("Livery Pack: {}", variant.code()),
            creator: DEFAULT_CREATOR.to_string(),
            minimum_game_version: DEFAULT_MINIMUM_GAME_VERSION.to_string(),
        }
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    pub fn with_minimum_game_version(mut self, version: impl Into<String>) -> Self {
        self.minimum_game_version = version.into();
        self
    }
}

fn failed(path: &Path, reason: impl ToString) -> LiveryError {
    LiveryError::DescriptorUpdateFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn read_descriptor(path: &Path) -> LiveryResult<Map<String, Value>> {
    let bytes = fs::read(path).map_err(|e| failed(path, e))?;
    match serde_json::from_slice(&bytes).map_err(|e| failed(path, e))? {
        Value::Object(map) => Ok(map),
        _ => Err(failed(path, "descriptor is not a JSON object")),
    }
}

fn write_descriptor(path: &Path, map: Map<String, Value>) -> LiveryResult<()> {
    let bytes = to_json_bytes(&Value::Object(map)).map_err(|e| failed(path, e))?;
    fs::write(path, bytes).map_err(|e| failed(path, e))
}

fn string_or(map: &Map<String, Value>, key: &str, default: &str) -> Value {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Value::String(s.clone()),
        _ => Value::String(default.to_string()),
    }
}

/// Apply the package metadata fields to a descriptor object.
pub fn apply_metadata(map: &mut Map<String, Value>, meta: &DescriptorMetadata) {
    let manufacturer = string_or(map, "manufacturer", DEFAULT_MANUFACTURER);
    let package_version = string_or(map, "package_version", DEFAULT_PACKAGE_VERSION);

    map.insert(
        "dependencies".into(),
        json!([{ "name": meta.dependency, "package_version": DEPENDENCY_VERSION }]),
    );
    map.insert("content_type".into(), json!("LIVERY"));
    map.insert("title".into(), json!(meta.title));
    map.insert("manufacturer".into(), manufacturer);
    map.insert("creator".into(), json!(meta.creator));
    map.insert("package_version".into(), package_version);
    map.insert(
        "minimum_game_version".into(),
        json!(meta.minimum_game_version),
    );
}

/// Format a package size the way the descriptor stores it.
pub fn format_package_size(size: u64) -> String {
    format!("{:020}", size)
}

/// Rewrite the descriptor's metadata fields.
pub fn update_metadata(path: &Path, meta: &DescriptorMetadata) -> LiveryResult<()> {
    let mut map = read_descriptor(path)?;
    apply_metadata(&mut map, meta);
    write_descriptor(path, map)?;
    info!(dependency = %meta.dependency, "Package descriptor metadata updated");
    Ok(())
}

/// Record the package's total size and update time in the descriptor.
///
/// The total is the content size plus the layout file plus the descriptor's
/// size as measured before this rewrite. Returns the total written.
pub fn update_total_size(path: &Path, content_size: u64, layout_size: u64) -> LiveryResult<u64> {
    let descriptor_size = fs::metadata(path).map_err(|e| failed(path, e))?.len();
    let total = content_size + layout_size + descriptor_size;

    let mut map = read_descriptor(path)?;
    map.insert(
        "total_package_size".into(),
        Value::String(format_package_size(total)),
    );

    let release_notes = map
        .entry("release_notes")
        .or_insert_with(|| json!({}));
    if !release_notes.is_object() {
        *release_notes = json!({});
    }
    if let Some(notes) = release_notes.as_object_mut() {
        let neutral = notes.entry("neutral").or_insert_with(|| json!({}));
        if !neutral.is_object() {
            *neutral = json!({});
        }
        if let Some(neutral) = neutral.as_object_mut() {
            let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
            neutral.insert("LastUpdate".into(), Value::String(now));
        }
    }

    write_descriptor(path, map)?;
    info!(total, "Package descriptor size updated");
    Ok(total)
}
