//! Livery Installer - PMDG livery archives into MSFS community packages
//!
//! This library turns livery archives (`.zip`, or proprietary `.ptp` through
//! an external converter) into installed livery folders inside a single
//! per-aircraft community package, then regenerates the package's
//! `layout.json` and `manifest.json`.
//!
//! The entry point is [`batch::BatchOrchestrator`], or [`batch::spawn_batch`]
//! to run a batch on a worker thread and follow it through
//! [`batch::BatchEvent`]s.

pub mod aircraft_cfg;
pub mod archive;
pub mod batch;
pub mod config;
pub mod error;
pub mod fs_ops;
pub mod install;
pub mod logging;
pub mod package;
pub mod staging;
pub mod variant;

pub use error::{LiveryError, LiveryResult, ToolFailure};
pub use variant::AircraftVariant;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
