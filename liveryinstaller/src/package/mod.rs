//! Package-level files of the community package.
//!
//! A package root holds the installed liveries plus two JSON files the
//! simulator reads: `layout.json` (the content manifest) and
//! `manifest.json` (the package descriptor).

pub mod descriptor;
pub mod layout;
pub mod root;

pub use descriptor::{update_metadata, update_total_size, DescriptorMetadata};
pub use layout::{filetime_ticks, generate_layout, LayoutEntry, LayoutSummary};
pub use root::PackageRoot;

use serde::Serialize;

/// Content manifest file name.
pub const LAYOUT_FILE: &str = "layout.json";

/// Package descriptor file name.
pub const DESCRIPTOR_FILE: &str = "manifest.json";

/// Serialize JSON with four-space indentation.
pub(crate) fn to_json_bytes<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}
