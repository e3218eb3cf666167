//! Core domain types for face dataset loading.

mod sample;
mod split;

pub use sample::{MaskedSample, Pixels, PixelsKind, PixelsSummary, SampleReport};
pub use split::{Split, SplitScheme, CELEBA_BOUNDARIES};
