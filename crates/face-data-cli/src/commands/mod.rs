//! CLI command definitions and handlers.

pub mod check;
pub mod dataset;
pub mod stats;

use clap::{Parser, Subcommand};

/// face-data - Inspect CelebAMask-HQ and FFHQ dataset trees
#[derive(Parser)]
#[command(name = "face-data")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Count the samples of every split
    Stats(stats::StatsArgs),
    /// Load every sample of a split and report its shape and value range
    Check(check::CheckArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Everything loaded.
    Success,
    /// At least one sample failed to load.
    SamplesFailed,
    /// Configuration or runtime error.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::SamplesFailed => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}
