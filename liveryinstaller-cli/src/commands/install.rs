//! Install command - run a batch and follow it with a progress bar.

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use liveryinstaller::batch::{spawn_batch, BatchEvent, BatchReport, PostProcessing};

use super::common::{resolve_settings, SettingsArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the install command.
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Livery archives (.zip or .ptp)
    #[arg(required = true)]
    pub archives: Vec<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Run the install command.
pub fn run(args: InstallArgs, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("install");

    let settings = resolve_settings(args.settings, runner.config())?;
    info!(
        variant = %settings.variant,
        archives = args.archives.len(),
        "Starting installation"
    );

    let total = args.archives.len() as u64;
    let (handle, events) =
        spawn_batch(settings, args.archives).map_err(|e| CliError::Worker(e.to_string()))?;

    let progress = progress_bar(total);
    follow(&progress, events);
    progress.finish_and_clear();

    let report = handle
        .join()
        .map_err(|_| CliError::Worker("batch worker panicked".to_string()))??;

    print_summary(&report);
    println!("Log: {}", runner.log_path().display());

    let failed = report.failures().count();
    if failed > 0 {
        return Err(CliError::ItemsFailed { failed });
    }
    Ok(())
}

fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} archives | {msg}")
    {
        pb.set_style(bar_style.progress_chars("=>-"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render events until the worker hangs up.
fn follow(pb: &ProgressBar, events: Receiver<BatchEvent>) {
    for event in events {
        match event {
            BatchEvent::ArchiveStarted { index, name, .. } => {
                pb.set_position(index as u64);
                pb.set_message(name);
            }
            BatchEvent::Stage { item, stage } => {
                pb.set_message(format!("{}: {}", item, stage.name()));
            }
            BatchEvent::Notice { message } => {
                pb.println(format!("  {}", style(message).dim()));
            }
            BatchEvent::ItemFinished(result) => {
                let mark = if result.success {
                    style("✓").green()
                } else {
                    style("✗").red()
                };
                pb.println(format!("{} {}: {}", mark, result.item, result.detail));
            }
            BatchEvent::PostProcessing(_) => {
                pb.set_message("Package files");
            }
            BatchEvent::Finished(report) => {
                pb.set_position(report.archives as u64);
            }
        }
    }
}

fn print_summary(report: &BatchReport) {
    println!();
    println!("{}", style("Installation Summary").bold().underlined());
    for (i, line) in report.summary_lines().iter().enumerate() {
        // The first line reports successes, the third the package files.
        let styled = match (i, &report.post_processing) {
            (0, _) if report.successes() > 0 => style(line.as_str()).green(),
            (1, _) if report.failures().next().is_some() => style(line.as_str()).red(),
            (2, PostProcessing::Completed { .. }) => style(line.as_str()).green(),
            (2, _) => style(line.as_str()).yellow(),
            _ => style(line.as_str()),
        };
        println!("{}", styled);
    }
}
