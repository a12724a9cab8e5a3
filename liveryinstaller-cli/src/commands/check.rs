//! Check command - validate settings and inputs without installing.

use std::path::PathBuf;

use clap::Args;
use console::style;

use liveryinstaller::batch::NO_INPUTS_ISSUE;
use liveryinstaller::config::ConfigFile;
use liveryinstaller::LiveryError;

use super::common::{resolve_settings, SettingsArgs};
use crate::error::CliError;

/// Arguments for the check command.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Livery archives to check as well (optional)
    pub archives: Vec<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Run the check command.
pub fn run(args: CheckArgs) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let settings = resolve_settings(args.settings, &config)?;

    let mut issues = settings.issues(&args.archives);
    if args.archives.is_empty() {
        issues.retain(|issue| issue != NO_INPUTS_ISSUE);
    }

    println!("Variant:          {}", settings.variant);
    println!("Package folder:   {}", settings.variant.package_folder());
    println!("Community folder: {}", settings.community_dir.display());
    println!("Reference folder: {}", settings.reference_dir.display());
    println!("State folder:     {}", settings.state_dir.display());
    if let Some(converter) = &settings.converter {
        println!("Converter:        {}", converter.display());
    }
    println!();

    if issues.is_empty() {
        println!("{} Ready to install", style("✓").green());
        return Ok(());
    }

    for issue in &issues {
        println!("{} {}", style("✗").red(), issue);
    }
    Err(CliError::Batch(LiveryError::ConfigurationInvalid(issues)))
}
