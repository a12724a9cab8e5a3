//! Config command - show the configuration file and its resolved values.

use console::style;
use liveryinstaller::config::{config_file_path, ConfigFile};
use liveryinstaller::logging::{default_log_dir, default_log_file};

use crate::error::CliError;

fn show(value: Option<String>) -> String {
    value.unwrap_or_else(|| "(not set)".to_string())
}

/// Run the config command.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let exists = path.exists();
    let config = ConfigFile::load()?;

    println!(
        "Configuration file: {}{}",
        style(path.display()).cyan(),
        if exists { "" } else { " (not found, using defaults)" }
    );
    println!();

    println!("{}", style("[paths]").bold());
    let display = |p: &Option<std::path::PathBuf>| p.as_ref().map(|p| p.display().to_string());
    println!("community_dir = {}", show(display(&config.paths.community_dir)));
    println!("reference_dir = {}", show(display(&config.paths.reference_dir)));
    println!("converter     = {}", show(display(&config.paths.converter)));
    let log_dir = config.paths.log_dir.clone().unwrap_or_else(default_log_dir);
    println!(
        "log_dir       = {} (log file {})",
        log_dir.display(),
        default_log_file()
    );
    println!();

    println!("{}", style("[state]").bold());
    if config.state.is_empty() {
        println!("(not set)");
    }
    for (dependency, dir) in &config.state {
        println!("{} = {}", dependency, dir.display());
    }
    println!();

    println!("{}", style("[install]").bold());
    println!(
        "variant                = {}",
        show(config.install.variant.map(|v| v.to_string()))
    );
    println!(
        "converter_timeout_secs = {}",
        show(config.install.converter_timeout_secs.map(|s| s.to_string()))
    );
    println!(
        "creator                = {}",
        show(config.install.creator.clone())
    );
    println!(
        "minimum_game_version   = {}",
        show(config.install.minimum_game_version.clone())
    );
    Ok(())
}
