//! Stats command - count the samples of every split.

use anyhow::Result;
use clap::Args;
use face_data_core::{Split, SplitScheme};
use serde::Serialize;
use tracing::info;

use super::dataset::{defaults, DatasetArgs, DatasetKind, OpenDataset};
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for the stats command.
#[derive(Args, Clone)]
pub struct StatsArgs {
    /// Dataset selection.
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl StatsArgs {
    /// Apply configuration file values, respecting CLI precedence.
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.dataset = args.dataset.with_config(config);
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        args
    }
}

/// Sample count of one split.
#[derive(Debug, Serialize)]
pub struct SplitCount {
    /// Split name.
    pub split: Split,
    /// Number of samples.
    pub count: usize,
}

/// Output of the stats command.
#[derive(Debug, Serialize)]
pub struct Stats {
    /// Dataset name.
    pub dataset: &'static str,
    /// Root directory.
    pub root: String,
    /// Resolution variant, FFHQ only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Counts in canonical split order.
    pub splits: Vec<SplitCount>,
}

/// Run the stats command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub fn run(args: &StatsArgs) -> Result<Stats> {
    let root = args.dataset.root()?;
    let (scheme, version) = match args.dataset.dataset {
        DatasetKind::CelebAMaskHq => (SplitScheme::CELEBA, None),
        DatasetKind::Ffhq => (SplitScheme::FFHQ, Some(args.dataset.version()?)),
    };
    info!("Counting {} splits under {}", scheme.dataset(), root.display());

    let mut splits = Vec::new();
    for split in scheme.splits() {
        let ds = match version {
            None => OpenDataset::celebamask(&root, split, None, None)?,
            Some(version) => {
                OpenDataset::ffhq(&root, defaults::IMG_SIZE, split, version, None, None)?
            }
        };
        splits.push(SplitCount {
            split,
            count: ds.len(),
        });
    }

    let stats = Stats {
        dataset: scheme.dataset(),
        root: root.display().to_string(),
        version: version.map(|v| v.to_string()),
        splits,
    };
    JsonOutput::stdout().write_value(&stats, args.pretty)?;
    Ok(stats)
}
