//! Livery Installer CLI - Command-line interface
//!
//! Installs PMDG livery archives into an MSFS community package.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::check::CheckArgs;
use commands::install::InstallArgs;

#[derive(Parser)]
#[command(name = "livery-installer")]
#[command(version, about = "Install PMDG livery archives into an MSFS community package", long_about = None)]
struct Cli {
    /// Show debug output on the console
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install livery archives into the variant's community package
    Install(InstallArgs),

    /// Validate settings and archives without installing anything
    Check(CheckArgs),

    /// List supported aircraft variants
    Variants,

    /// Show the configuration file path and values
    Config,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(args, cli.verbose),
        Commands::Check(args) => commands::check::run(args),
        Commands::Variants => {
            commands::variants::run();
            Ok(())
        }
        Commands::Config => commands::config::run(),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install() {
        let cli = Cli::try_parse_from([
            "livery-installer",
            "install",
            "a.zip",
            "b.ptp",
            "--variant",
            "777-300er",
            "--timeout",
            "60",
        ])
        .unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.archives.len(), 2);
                assert_eq!(
                    args.settings.variant,
                    Some(liveryinstaller::AircraftVariant::B777_300ER)
                );
                assert_eq!(args.settings.timeout, Some(60));
            }
            _ => panic!("expected install"),
        }
    }

    #[test]
    fn test_install_requires_archives() {
        assert!(Cli::try_parse_from(["livery-installer", "install"]).is_err());
    }

    #[test]
    fn test_unknown_variant_rejected() {
        assert!(Cli::try_parse_from([
            "livery-installer",
            "install",
            "a.zip",
            "--variant",
            "747-8"
        ])
        .is_err());
    }
}
