//! Single-image transform stages.

use rand::{Rng, RngCore};

use super::ops::{self, Size};
use super::Transform;
use crate::domain::Pixels;
use crate::error::Result;

/// Runs stages in order, feeding each output to the next.
#[derive(Default)]
pub struct Compose {
    stages: Vec<Box<dyn Transform>>,
}

impl Compose {
    /// Creates a pipeline from boxed stages.
    #[must_use]
    pub fn new(stages: Vec<Box<dyn Transform>>) -> Self {
        Self { stages }
    }

    /// Appends a stage.
    #[must_use]
    pub fn then<T: Transform + 'static>(mut self, stage: T) -> Self {
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

impl Transform for Compose {
    fn apply(&self, input: Pixels, rng: &mut dyn RngCore) -> Result<Pixels> {
        self.stages
            .iter()
            .try_fold(input, |pixels, stage| stage.apply(pixels, rng))
    }
}

/// Resizes with smooth interpolation.
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

impl Transform for Resize {
    fn apply(&self, input: Pixels, _rng: &mut dyn RngCore) -> Result<Pixels> {
        let img = input.into_image()?;
        Ok(Pixels::Image(ops::resize_smooth(&img, self.size)?))
    }
}

/// Mirrors left to right with probability `p`.
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

impl Transform for RandomHorizontalFlip {
    fn apply(&self, input: Pixels, rng: &mut dyn RngCore) -> Result<Pixels> {
        if rng.gen::<f64>() < self.p {
            ops::hflip(input)
        } else {
            Ok(input)
        }
    }
}

/// Converts an image to a `C x H x W` float tensor scaled to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToTensor;

impl Transform for ToTensor {
    fn apply(&self, input: Pixels, _rng: &mut dyn RngCore) -> Result<Pixels> {
        let img = input.into_image()?;
        Ok(Pixels::Tensor(ops::to_float_tensor(&img)?))
    }
}

/// Per-channel `(x - mean) / std` on a float tensor.
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

impl Transform for Normalize {
    fn apply(&self, input: Pixels, _rng: &mut dyn RngCore) -> Result<Pixels> {
        let t = input.into_tensor()?;
        Ok(Pixels::Tensor(ops::normalize(&t, &self.mean, &self.std)?))
    }
}

/// A transform backed by a closure.
pub struct FnTransform<F>(F);

/// Wraps a closure as a [`Transform`].
pub fn from_fn<F>(f: F) -> FnTransform<F>
where
    F: Fn(Pixels, &mut dyn RngCore) -> Result<Pixels> + Send + Sync,
{
    FnTransform(f)
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(Pixels, &mut dyn RngCore) -> Result<Pixels> + Send + Sync,
{
    fn apply(&self, input: Pixels, rng: &mut dyn RngCore) -> Result<Pixels> {
        (self.0)(input, rng)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient(width: u32, height: u32) -> Pixels {
        #[allow(clippy::cast_possible_truncation)]
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]));
        Pixels::Image(DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn test_compose_runs_in_order() {
        let pipeline = Compose::default()
            .then(Resize::square(8))
            .then(ToTensor)
            .then(Normalize::symmetric());
        let mut rng = StdRng::seed_from_u64(0);
        let out = pipeline.apply(gradient(32, 16), &mut rng).unwrap();
        let t = out.into_tensor().unwrap();
        assert_eq!(t.dims(), &[3, 8, 8]);
    }

    #[test]
    fn test_compose_from_boxed_stages() {
        let stages: Vec<Box<dyn Transform>> =
            vec![Box::new(Resize::square(4)), Box::new(ToTensor)];
        let pipeline = Compose::new(stages);
        assert_eq!(pipeline.len(), 2);
        let mut rng = StdRng::seed_from_u64(0);
        let t = pipeline.apply(gradient(8, 8), &mut rng).unwrap().into_tensor().unwrap();
        assert_eq!(t.dims(), &[3, 4, 4]);
    }

    #[test]
    fn test_normalize_rejects_zero_std_up_front() {
        assert!(Normalize::new([0.5], [0.0]).is_err());
        assert!(Normalize::new(vec![0.5, 0.5], vec![0.2, 0.2, 0.2]).is_err());
        assert!(Normalize::new([0.485, 0.456, 0.406], [0.229, 0.224, 0.225]).is_ok());
    }

    #[test]
    fn test_compose_order_matters() {
        // Normalizing before tensor conversion is a type error.
        let pipeline = Compose::default()
            .then(Normalize::new([0.5], [0.5]).unwrap())
            .then(ToTensor);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(pipeline.apply(gradient(4, 4), &mut rng).is_err());
    }

    #[test]
    fn test_flip_probability_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let always = RandomHorizontalFlip::new(1.0);
        let never = RandomHorizontalFlip::new(0.0);
        for _ in 0..16 {
            let flipped = always.apply(gradient(4, 1), &mut rng).unwrap();
            let px = flipped.as_image().unwrap().to_rgb8();
            assert_eq!(px.get_pixel(0, 0).0[0], 3);

            let kept = never.apply(gradient(4, 1), &mut rng).unwrap();
            let px = kept.as_image().unwrap().to_rgb8();
            assert_eq!(px.get_pixel(0, 0).0[0], 0);
        }
    }

    #[test]
    fn test_flip_probability_is_clamped() {
        assert!((RandomHorizontalFlip::new(2.0).probability() - 1.0).abs() < f64::EPSILON);
        assert!(RandomHorizontalFlip::new(-1.0).probability().abs() < f64::EPSILON);
    }

    #[test]
    fn test_closure_transform() {
        let identity = from_fn(|pixels, _rng: &mut dyn RngCore| Ok(pixels));
        let mut rng = StdRng::seed_from_u64(1);
        let out = identity.apply(gradient(2, 2), &mut rng).unwrap();
        assert!(out.as_image().is_some());
    }
}
