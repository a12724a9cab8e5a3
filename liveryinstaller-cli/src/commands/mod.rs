//! CLI command implementations.
//!
//! - [`install`] - Install livery archives into the community package
//! - [`check`] - Validate settings and inputs without installing
//! - [`variants`] - List supported aircraft variants
//! - [`config`] - Show the configuration file and resolved values

pub mod check;
pub mod common;
pub mod config;
pub mod install;
pub mod variants;
