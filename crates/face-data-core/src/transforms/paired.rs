//! Transform stages applied jointly to an image / mask / color mask triple.
//!
//! Geometric decisions are made once per call and applied to all three
//! members, so the triple stays aligned. Label masks are never interpolated
//! or rescaled.

use rand::{Rng, RngCore};

use super::ops::{self, Size};
use super::PairedTransform;
use crate::domain::{MaskedSample, Pixels};
use crate::error::Result;

/// Runs paired stages in order, feeding each output triple to the next.
#[derive(Default)]
pub struct Compose {
    stages: Vec<Box<dyn PairedTransform>>,
}

impl Compose {
    /// Creates a pipeline from boxed stages.
    #[must_use]
    pub fn new(stages: Vec<Box<dyn PairedTransform>>) -> Self {
        Self { stages }
    }

    /// Appends a stage.
    #[must_use]
    pub fn then<T: PairedTransform + 'static>(mut self, stage: T) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl PairedTransform for Compose {
    fn apply(&self, sample: MaskedSample, rng: &mut dyn RngCore) -> Result<MaskedSample> {
        self.stages
            .iter()
            .try_fold(sample, |sample, stage| stage.apply(sample, rng))
    }
}

/// Resizes the image smoothly and both masks with nearest-neighbour sampling.
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    size: Size,
}

impl Resize {
    /// Resize to `size`.
    #[must_use]
    pub const fn new(size: Size) -> Self {
        Self { size }
    }

    /// Resize to a `size x size` square.
    #[must_use]
    pub const fn square(size: u32) -> Self {
        Self::new(Size::square(size))
    }
}

impl PairedTransform for Resize {
    fn apply(&self, sample: MaskedSample, _rng: &mut dyn RngCore) -> Result<MaskedSample> {
        let (image, mask, mask_color) = sample.into_parts();
        Ok(MaskedSample {
            image: Pixels::Image(ops::resize_smooth(&image.into_image()?, self.size)?),
            mask: Pixels::Image(ops::resize_nearest(&mask.into_image()?, self.size)?),
            mask_color: Pixels::Image(ops::resize_nearest(&mask_color.into_image()?, self.size)?),
        })
    }
}

/// Mirrors all three members together with probability `p`.
#[derive(Debug, Clone, Copy)]
pub struct RandomHorizontalFlip {
    p: f64,
}

impl RandomHorizontalFlip {
    /// Flip with probability `p` (clamped to `[0, 1]`).
    #[must_use]
    pub fn new(p: f64) -> Self {
        Self {
            p: p.clamp(0.0, 1.0),
        }
    }

    /// The flip probability.
    #[must_use]
    pub const fn probability(&self) -> f64 {
        self.p
    }
}

impl PairedTransform for RandomHorizontalFlip {
    fn apply(&self, sample: MaskedSample, rng: &mut dyn RngCore) -> Result<MaskedSample> {
        // One draw for the whole triple.
        if rng.gen::<f64>() >= self.p {
            return Ok(sample);
        }
        let (image, mask, mask_color) = sample.into_parts();
        Ok(MaskedSample {
            image: ops::hflip(image)?,
            mask: ops::hflip(mask)?,
            mask_color: ops::hflip(mask_color)?,
        })
    }
}

/// Converts image and color mask to `[0, 1]` float tensors and the label mask
/// to an `i64` tensor of raw class indices.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToTensor;

impl PairedTransform for ToTensor {
    fn apply(&self, sample: MaskedSample, _rng: &mut dyn RngCore) -> Result<MaskedSample> {
        let (image, mask, mask_color) = sample.into_parts();
        Ok(MaskedSample {
            image: Pixels::Tensor(ops::to_float_tensor(&image.into_image()?)?),
            mask: Pixels::Tensor(ops::to_label_tensor(&mask.into_image()?)?),
            mask_color: Pixels::Tensor(ops::to_float_tensor(&mask_color.into_image()?)?),
        })
    }
}

/// Normalizes image and color mask; the label mask passes through untouched.
#[derive(Debug, Clone)]
pub struct Normalize {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Normalize {
    /// Normalize with per-channel (or single broadcast) statistics.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DatasetError::InvalidNormalization`] for empty or
    /// non-finite statistics, a zero std, or mean and std lists of
    /// different per-channel lengths.
    pub fn new(mean: impl Into<Vec<f32>>, std: impl Into<Vec<f32>>) -> Result<Self> {
        let (mean, std) = (mean.into(), std.into());
        ops::check_stats(&mean, &std)?;
        Ok(Self { mean, std })
    }

    /// Mean and std 0.5 on every channel, mapping `[0, 1]` onto `[-1, 1]`.
    #[must_use]
    pub fn symmetric() -> Self {
        Self {
            mean: vec![0.5],
            std: vec![0.5],
        }
    }
}

impl PairedTransform for Normalize {
    fn apply(&self, sample: MaskedSample, _rng: &mut dyn RngCore) -> Result<MaskedSample> {
        let (image, mask, mask_color) = sample.into_parts();
        let image = ops::normalize(&image.into_tensor()?, &self.mean, &self.std)?;
        let mask_color = ops::normalize(&mask_color.into_tensor()?, &self.mean, &self.std)?;
        Ok(MaskedSample {
            image: Pixels::Tensor(image),
            mask,
            mask_color: Pixels::Tensor(mask_color),
        })
    }
}

/// A paired transform backed by a closure.
pub struct FnPairedTransform<F>(F);

/// Wraps a closure as a [`PairedTransform`].
pub fn from_fn<F>(f: F) -> FnPairedTransform<F>
where
    F: Fn(MaskedSample, &mut dyn RngCore) -> Result<MaskedSample> + Send + Sync,
{
    FnPairedTransform(f)
}

impl<F> PairedTransform for FnPairedTransform<F>
where
    F: Fn(MaskedSample, &mut dyn RngCore) -> Result<MaskedSample> + Send + Sync,
{
    fn apply(&self, sample: MaskedSample, rng: &mut dyn RngCore) -> Result<MaskedSample> {
        (self.0)(sample, rng)
    }
}
