//! Check command - load every sample of a split through its pipeline.

use std::io::IsTerminal;

use anyhow::Result;
use clap::{Args, ValueEnum};
use face_data_adapters::TransformType;
use face_data_core::{ProgressEvent, ProgressSink, ResultOutput, Split};
use tracing::info;

use super::dataset::{defaults, DatasetArgs, DatasetKind, OpenDataset, PairedPipeline};
use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Parse and validate a probability (0.0-1.0).
fn parse_probability(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Parse a positive pixel size.
fn parse_size(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(0) => Err("size must be positive".to_string()),
        Ok(v) => Ok(v),
        Err(_) => Err(format!("'{s}' is not a valid size")),
    }
}

/// Arguments for the check command.
#[derive(Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct CheckArgs {
    /// Dataset selection.
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Split: train, valid, test or all
    #[arg(long)]
    pub split: Option<Split>,

    /// FFHQ output size
    #[arg(long, value_parser = parse_size)]
    pub img_size: Option<u32>,

    /// FFHQ transform preset: resize or none
    #[arg(long)]
    pub transform_type: Option<String>,

    /// CelebAMask-HQ square resize target
    #[arg(long, value_parser = parse_size)]
    pub resize: Option<u32>,

    /// CelebAMask-HQ flip probability (0.0-1.0)
    #[arg(long, value_parser = parse_probability)]
    pub flip_prob: Option<f64>,

    /// Seed for random augmentation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Check at most this many samples
    #[arg(long)]
    pub limit: Option<usize>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Normalization mean from the config file (not from CLI).
    #[arg(skip)]
    mean: Option<Vec<f32>>,

    /// Normalization std from the config file (not from CLI).
    #[arg(skip)]
    std: Option<Vec<f32>>,
}

impl CheckArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.dataset = args.dataset.with_config(config);

        let split = match args.dataset.dataset {
            DatasetKind::CelebAMaskHq => config.celebamask.split.as_deref(),
            DatasetKind::Ffhq => config.ffhq.split.as_deref(),
        };
        if args.split.is_none() {
            args.split = split.and_then(|s| s.parse().ok());
        }

        args.img_size = args.img_size.or(config.ffhq.img_size);
        if args.transform_type.is_none() {
            args.transform_type.clone_from(&config.ffhq.transform_type);
        }
        args.resize = args.resize.or(config.celebamask.resize);
        args.flip_prob = args.flip_prob.or(config.celebamask.flip_prob);
        args.mean.clone_from(&config.celebamask.mean);
        args.std.clone_from(&config.celebamask.std);
        args.seed = args.seed.or(config.general.seed);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        args
    }

    /// Get split with fallback to train.
    fn split(&self) -> Split {
        self.split.unwrap_or(defaults::SPLIT)
    }

    /// Get flip probability; augmented splits flip by default.
    fn flip_prob(&self) -> f64 {
        self.flip_prob.unwrap_or_else(|| {
            if self.split().is_augmented() {
                defaults::FLIP_PROB
            } else {
                0.0
            }
        })
    }

    /// Get FFHQ transform type; `none` disables preprocessing.
    fn transform_type(&self) -> Result<Option<TransformType>> {
        match self.transform_type.as_deref() {
            None => Ok(Some(TransformType::default())),
            Some(t) => match t.parse()? {
                TransformType::None => Ok(None),
                other => Ok(Some(other)),
            },
        }
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Jsonl)
    }

    fn pipeline(&self) -> PairedPipeline {
        PairedPipeline {
            resize: self.resize,
            flip_prob: self.flip_prob(),
            mean: self.mean.clone().unwrap_or_else(|| vec![defaults::NORM]),
            std: self.std.clone().unwrap_or_else(|| vec![defaults::NORM]),
        }
    }

    fn open(&self) -> Result<OpenDataset> {
        let root = self.dataset.root()?;
        match self.dataset.dataset {
            DatasetKind::CelebAMaskHq => {
                OpenDataset::celebamask(&root, self.split(), Some(&self.pipeline()), self.seed)
            }
            DatasetKind::Ffhq => OpenDataset::ffhq(
                &root,
                self.img_size.unwrap_or(defaults::IMG_SIZE),
                self.split(),
                self.dataset.version()?,
                self.transform_type()?,
                self.seed,
            ),
        }
    }
}

/// Result of running the check command.
pub struct CheckResult {
    /// Number of samples loaded.
    pub processed: usize,
    /// Number of samples that failed.
    pub skipped: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the check command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &CheckArgs) -> Result<CheckResult> {
    let dataset = args.open()?;
    let total = args
        .limit
        .map_or(dataset.len(), |limit| limit.min(dataset.len()));
    info!("Checking {total} of {} samples", dataset.len());

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress_bar = ProgressBar::new(Some(total as u64), args.quiet, show_progress);
    let output = match args.format() {
        OutputFormat::Jsonl => JsonOutput::stdout(),
        OutputFormat::Json => JsonOutput::array(Box::new(std::io::stdout()), args.pretty),
    };

    process_samples(&dataset, total, &output, &progress_bar)
}

/// Load samples `0..total`, reporting each through the ports.
fn process_samples(
    dataset: &OpenDataset,
    total: usize,
    output: &dyn ResultOutput,
    progress: &dyn ProgressSink,
) -> Result<CheckResult> {
    let mut processed = 0usize;
    let mut skipped = 0usize;

    for index in 0..total {
        let path = dataset.display_path(index);
        progress.on_event(ProgressEvent::Started {
            path: path.clone(),
            index,
            total: Some(total),
        });

        let report = match dataset.report(index) {
            Ok(r) => r,
            Err(e) => {
                progress.on_event(ProgressEvent::Skipped {
                    path,
                    reason: e.to_string(),
                });
                skipped += 1;
                continue;
            }
        };

        output.write(&report)?;
        progress.on_event(ProgressEvent::Completed { report });
        processed += 1;
    }
    output.flush()?;

    progress.on_event(ProgressEvent::Finished { processed, skipped });

    let exit_code = if skipped > 0 {
        ExitCode::SamplesFailed
    } else {
        ExitCode::Success
    };

    Ok(CheckResult {
        processed,
        skipped,
        exit_code,
    })
}
