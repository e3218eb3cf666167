//! Transform stages for single images and for aligned mask triples.
//!
//! Stages take their randomness from the caller, so a dataset can drive
//! every random decision from one seeded generator.

pub mod ops;
pub mod paired;
pub mod single;

use rand::RngCore;

use crate::domain::{MaskedSample, Pixels};
use crate::error::Result;

pub use ops::Size;
pub use paired::Compose as PairedCompose;
pub use single::Compose;

/// A stage applied to one image (or tensor).
pub trait Transform: Send + Sync {
    /// Transforms `input`, drawing any random decisions from `rng`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is of the wrong kind for this stage
    /// (e.g. normalizing a decoded image) or a tensor operation fails.
    fn apply(&self, input: Pixels, rng: &mut dyn RngCore) -> Result<Pixels>;
}

/// A stage applied jointly to an image, its label mask and its color mask.
pub trait PairedTransform: Send + Sync {
    /// Transforms all three members, keeping them spatially aligned.
    ///
    /// # Errors
    ///
    /// Returns an error if a member is of the wrong kind for this stage or a
    /// tensor operation fails.
    fn apply(&self, sample: MaskedSample, rng: &mut dyn RngCore) -> Result<MaskedSample>;
}

impl<T: Transform + ?Sized> Transform for Box<T> {
    fn apply(&self, input: Pixels, rng: &mut dyn RngCore) -> Result<Pixels> {
        (**self).apply(input, rng)
    }
}

impl<T: PairedTransform + ?Sized> PairedTransform for Box<T> {
    fn apply(&self, sample: MaskedSample, rng: &mut dyn RngCore) -> Result<MaskedSample> {
        (**self).apply(sample, rng)
    }
}
