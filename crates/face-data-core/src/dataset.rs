//! Indexable dataset abstraction shared by the dataset adapters.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::trace;

use crate::domain::{MaskedSample, Pixels, SampleReport, Split};
use crate::error::{DatasetError, Result};

/// Random source owned by a dataset.
///
/// Each [`Dataset::get`] call forks a fresh generator from this one, so the
/// lock is never held while images decode. With a fixed seed, the sequence
/// of random decisions depends only on the order of `get` calls.
#[derive(Debug)]
pub struct SharedRng(Mutex<StdRng>);

impl SharedRng {
    /// Deterministic generator.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }

    /// Generator seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self(Mutex::new(StdRng::from_entropy()))
    }

    /// Seeded when `seed` is given, from entropy otherwise.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }

    /// Derives an independent generator for one sample.
    #[must_use]
    pub fn fork(&self) -> StdRng {
        let seed = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_u64();
        StdRng::seed_from_u64(seed)
    }
}

/// Fails with [`DatasetError::IndexOutOfRange`] unless `index < len`.
pub fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(DatasetError::IndexOutOfRange { index, len })
    }
}

/// A finite, indexable collection of samples for one split.
///
/// Index order is fixed at construction and stable for the lifetime of the
/// value.
pub trait Dataset: Send + Sync {
    /// What `get` returns.
    type Item;

    /// Human-readable dataset name.
    fn name(&self) -> &'static str;

    /// The split this instance serves.
    fn split(&self) -> Split;

    /// Number of samples.
    fn len(&self) -> usize;

    /// Whether the split holds no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Source files backing sample `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::IndexOutOfRange`] if `index >= len()`.
    fn paths(&self, index: usize) -> Result<Vec<PathBuf>>;

    /// Loads and transforms sample `index` using the given random source.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range, a file fails to decode,
    /// or a transform stage fails.
    fn get_with_rng(&self, index: usize, rng: &mut dyn RngCore) -> Result<Self::Item>;

    /// The dataset's own random source.
    fn rng(&self) -> &SharedRng;

    /// Loads and transforms sample `index` using the dataset's random source.
    ///
    /// # Errors
    ///
    /// See [`Dataset::get_with_rng`].
    fn get(&self, index: usize) -> Result<Self::Item> {
        check_index(index, self.len())?;
        trace!(dataset = self.name(), split = %self.split(), index, "Loading sample");
        let mut rng = self.rng().fork();
        self.get_with_rng(index, &mut rng)
    }

    /// Loads sample `index` and summarizes it.
    ///
    /// # Errors
    ///
    /// See [`Dataset::get`].
    fn report(&self, index: usize) -> Result<SampleReport>
    where
        Self::Item: Summarize,
    {
        let item = self.get(index)?;
        let paths = self
            .paths(index)?
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        item.summarize(index, paths)
    }
}

/// Produces a [`SampleReport`] for a loaded sample.
pub trait Summarize {
    /// Summarizes `self`, loaded from `paths` at position `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if a tensor cannot be read back.
    fn summarize(&self, index: usize, paths: Vec<String>) -> Result<SampleReport>;
}

impl Summarize for Pixels {
    fn summarize(&self, index: usize, paths: Vec<String>) -> Result<SampleReport> {
        Ok(SampleReport {
            index,
            paths,
            image: self.summary()?,
            mask: None,
            mask_color: None,
        })
    }
}

impl Summarize for MaskedSample {
    fn summarize(&self, index: usize, paths: Vec<String>) -> Result<SampleReport> {
        Ok(SampleReport {
            index,
            paths,
            image: self.image.summary()?,
            mask: Some(self.mask.summary()?),
            mask_color: Some(self.mask_color.summary()?),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};
    use rand::Rng;

    /// Returns a constant gray image whose level is drawn from the rng.
    struct Noise {
        len: usize,
        rng: SharedRng,
    }

    impl Dataset for Noise {
        type Item = Pixels;

        fn name(&self) -> &'static str {
            "noise"
        }

        fn split(&self) -> Split {
            Split::All
        }

        fn len(&self) -> usize {
            self.len
        }

        fn paths(&self, index: usize) -> Result<Vec<PathBuf>> {
            check_index(index, self.len)?;
            Ok(vec![PathBuf::from(format!("{index}.png"))])
        }

        fn get_with_rng(&self, index: usize, rng: &mut dyn RngCore) -> Result<Pixels> {
            check_index(index, self.len)?;
            let level: u8 = rng.gen();
            Ok(Pixels::Image(DynamicImage::ImageLuma8(GrayImage::from_pixel(
                2,
                2,
                Luma([level]),
            ))))
        }

        fn rng(&self) -> &SharedRng {
            &self.rng
        }
    }

    fn levels(ds: &Noise) -> Vec<f64> {
        (0..ds.len()).map(|i| ds.report(i).unwrap().image.max).collect()
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = Noise {
            len: 5,
            rng: SharedRng::from_seed(42),
        };
        let b = Noise {
            len: 5,
            rng: SharedRng::from_seed(42),
        };
        assert_eq!(levels(&a), levels(&b));
    }

    #[test]
    fn test_out_of_range() {
        let ds = Noise {
            len: 2,
            rng: SharedRng::new(None),
        };
        assert!(matches!(
            ds.get(2),
            Err(DatasetError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(!ds.is_empty());
    }

    #[test]
    fn test_report_lists_paths() {
        let ds = Noise {
            len: 3,
            rng: SharedRng::from_seed(0),
        };
        let report = ds.report(1).unwrap();
        assert_eq!(report.index, 1);
        assert_eq!(report.paths, vec!["1.png".to_string()]);
        assert!(report.mask.is_none());
    }
}
