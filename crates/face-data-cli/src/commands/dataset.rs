//! Dataset selection shared by the commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use face_data_adapters::{CelebAMaskHq, Ffhq, FfhqVersion, TransformType};
use face_data_core::transforms::paired::{
    Compose, Normalize, RandomHorizontalFlip, Resize, ToTensor,
};
use face_data_core::{Dataset, SampleReport, Split};

use crate::config::{expand_home, AppConfig};

/// Hardcoded defaults, below config files and CLI flags.
pub mod defaults {
    use face_data_core::Split;

    /// Default split.
    pub const SPLIT: Split = Split::Train;
    /// FFHQ output size.
    pub const IMG_SIZE: u32 = 256;
    /// Flip probability on augmented splits.
    pub const FLIP_PROB: f64 = 0.5;
    /// Normalization mean and std.
    pub const NORM: f32 = 0.5;
}

/// Supported datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatasetKind {
    /// CelebAMask-HQ (image, label mask, color mask)
    #[value(name = "celebamask-hq")]
    CelebAMaskHq,
    /// FFHQ (single images)
    Ffhq,
}

/// Arguments selecting a dataset on disk.
#[derive(Args, Clone)]
pub struct DatasetArgs {
    /// Dataset to open
    #[arg(long, value_enum)]
    pub dataset: DatasetKind,

    /// Dataset root directory (falls back to the config file)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// FFHQ resolution variant: images1024x1024 or thumbnails128x128
    #[arg(long, value_name = "VARIANT")]
    pub version: Option<String>,
}

impl DatasetArgs {
    /// Fill unset values from the config file.
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        match self.dataset {
            DatasetKind::CelebAMaskHq => {
                if self.root.is_none() {
                    self.root.clone_from(&config.celebamask.root);
                }
            }
            DatasetKind::Ffhq => {
                if self.root.is_none() {
                    self.root.clone_from(&config.ffhq.root);
                }
                if self.version.is_none() {
                    self.version.clone_from(&config.ffhq.version);
                }
            }
        }
        self
    }

    /// Root directory with `~` expanded.
    pub fn root(&self) -> Result<PathBuf> {
        let root = self
            .root
            .as_deref()
            .context("No dataset root given. Pass --root or set it in the config file")?;
        Ok(expand_home(root))
    }

    /// FFHQ variant, default 1024x1024.
    pub fn version(&self) -> Result<FfhqVersion> {
        Ok(match &self.version {
            Some(v) => v.parse()?,
            None => FfhqVersion::default(),
        })
    }
}

/// Pipeline settings for the masked dataset.
#[derive(Debug, Clone)]
pub struct PairedPipeline {
    /// Square resize target, no resize when unset.
    pub resize: Option<u32>,
    /// Flip probability.
    pub flip_prob: f64,
    /// Normalization mean.
    pub mean: Vec<f32>,
    /// Normalization std.
    pub std: Vec<f32>,
}

impl PairedPipeline {
    /// Resize, flip, tensor conversion, normalization.
    pub fn build(&self) -> face_data_core::Result<Compose> {
        let normalize = Normalize::new(self.mean.clone(), self.std.clone())?;
        let mut pipeline = Compose::default();
        if let Some(size) = self.resize {
            pipeline = pipeline.then(Resize::square(size));
        }
        Ok(pipeline
            .then(RandomHorizontalFlip::new(self.flip_prob))
            .then(ToTensor)
            .then(normalize))
    }
}

/// An opened dataset of either kind.
pub enum OpenDataset {
    /// Masked triples.
    CelebAMaskHq(CelebAMaskHq),
    /// Single images.
    Ffhq(Ffhq),
}

impl OpenDataset {
    /// Opens CelebAMask-HQ, optionally with a paired pipeline.
    pub fn celebamask(
        root: &Path,
        split: Split,
        pipeline: Option<&PairedPipeline>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let mut builder = CelebAMaskHq::builder(root).split(split);
        if let Some(p) = pipeline {
            builder = builder.transforms(p.build().context("Invalid transform pipeline")?);
        }
        if let Some(seed) = seed {
            builder = builder.seed(seed);
        }
        let ds = builder
            .build()
            .with_context(|| format!("Failed to open CelebAMask-HQ at {}", root.display()))?;
        Ok(Self::CelebAMaskHq(ds))
    }

    /// Opens FFHQ.
    pub fn ffhq(
        root: &Path,
        img_size: u32,
        split: Split,
        version: FfhqVersion,
        transform_type: Option<TransformType>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let mut builder = Ffhq::builder(root, img_size)
            .split(split)
            .version(version)
            .transform_type(transform_type);
        if let Some(seed) = seed {
            builder = builder.seed(seed);
        }
        let ds = builder
            .build()
            .with_context(|| format!("Failed to open FFHQ at {}", root.display()))?;
        Ok(Self::Ffhq(ds))
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::CelebAMaskHq(ds) => ds.len(),
            Self::Ffhq(ds) => ds.len(),
        }
    }

    /// Display path of sample `index` (the face image for masked datasets).
    #[must_use]
    pub fn display_path(&self, index: usize) -> String {
        let paths = match self {
            Self::CelebAMaskHq(ds) => ds.paths(index),
            Self::Ffhq(ds) => ds.paths(index),
        };
        paths
            .ok()
            .and_then(|p| p.into_iter().next())
            .map_or_else(|| format!("sample {index}"), |p| p.display().to_string())
    }

    /// Loads and summarizes sample `index`.
    pub fn report(&self, index: usize) -> face_data_core::Result<SampleReport> {
        match self {
            Self::CelebAMaskHq(ds) => ds.report(index),
            Self::Ffhq(ds) => ds.report(index),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use face_data_core::DatasetError;
    use face_data_test_support::CelebAMaskTreeBuilder;

    use super::*;

    fn pipeline(std: Vec<f32>) -> PairedPipeline {
        PairedPipeline {
            resize: Some(8),
            flip_prob: 0.0,
            mean: vec![defaults::NORM; 3],
            std,
        }
    }

    #[test]
    fn test_pipeline_rejects_zero_std() {
        let err = pipeline(vec![0.5, 0.0, 0.5]).build().err();
        assert!(matches!(err, Some(DatasetError::InvalidNormalization(_))));
        assert!(err.is_some_and(|e| e.is_config_error()));
    }

    #[test]
    fn test_invalid_pipeline_fails_before_loading() {
        let tree = CelebAMaskTreeBuilder::new(vec![0]).build().unwrap();
        let invalid = pipeline(vec![0.0]);
        let err = OpenDataset::celebamask(tree.path(), Split::Train, Some(&invalid), None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("Invalid transform pipeline"));
    }

    #[test]
    fn test_default_pipeline_opens() {
        let tree = CelebAMaskTreeBuilder::new(vec![0, 1]).build().unwrap();
        let ds = OpenDataset::celebamask(
            tree.path(),
            Split::Train,
            Some(&pipeline(vec![defaults::NORM; 3])),
            Some(1),
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.report(1).is_ok());
    }
}
