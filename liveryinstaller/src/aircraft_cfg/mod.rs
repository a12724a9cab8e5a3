//! Aircraft configuration files.
//!
//! [`document`] holds the line-preserving parser every edit goes through,
//! [`transform`] applies the installer's edits to `aircraft.cfg`, and
//! [`texture_cfg`] maintains texture fallback chains.

pub mod document;
pub mod texture_cfg;
pub mod transform;

pub use document::{CfgDocument, Line, Section};
pub use texture_cfg::{
    add_fallback_to_texture_dir, add_texture_fallback, sibling_fallback, TEXTURE_CFG,
};
pub use transform::{
    base_container_value, detect_engine_suffix, transform_file, transform_text, TransformOutcome,
};
