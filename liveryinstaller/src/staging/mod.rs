//! Staged content handling.
//!
//! Extraction and conversion leave a directory in whatever shape the livery
//! author shipped. This module turns that into something the materializer
//! understands:
//!
//! - [`nested`] decides whether a staged directory is a livery or a pack of
//!   further archives
//! - [`multi`] reads the manifest of multi-livery PTP packages
//! - [`reorganizer`] normalizes a livery into [`CanonicalContent`]
//! - [`naming`] resolves the display name and install folder

pub mod multi;
pub mod naming;
pub mod nested;
pub mod reorganizer;

pub use multi::{read_multi_livery_pack, PackEntry};
pub use naming::{livery_folder_name, resolve_display_name, NameSources};
pub use nested::{classify, unwrap_single_dir, ContentShape};
pub use reorganizer::{reorganize, CanonicalContent, CONFIG_FILE, OPTIONS_FILE};
