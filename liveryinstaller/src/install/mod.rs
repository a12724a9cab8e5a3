//! Installing canonical content into the package root.

pub mod materializer;
pub mod sidecar;

pub use materializer::{
    airplanes_dir, is_auxiliary_file, materialize, InstalledLivery, AUX_EXTENSIONS,
};
pub use sidecar::{atc_id_from_config, relocate_sidecar, SidecarOutcome};
