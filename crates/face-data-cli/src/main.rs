//! face-data CLI - Inspect CelebAMask-HQ and FFHQ dataset trees.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{check, stats, Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let exit_code = match cli.command {
        Commands::Stats(args) => {
            match stats::run(&stats::StatsArgs::with_config(args, &config)) {
                Ok(_) => ExitCode::Success,
                Err(e) => {
                    eprintln!("error: {e:#}");
                    ExitCode::Error
                }
            }
        }
        Commands::Check(args) => {
            match check::run(&check::CheckArgs::with_config(args, &config)) {
                Ok(result) => {
                    info!(
                        "Loaded {} samples, {} failed",
                        result.processed, result.skipped
                    );
                    result.exit_code
                }
                Err(e) => {
                    eprintln!("error: {e:#}");
                    ExitCode::Error
                }
            }
        }
    };

    exit_code.into()
}
