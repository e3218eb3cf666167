//! Face Data Core - Domain types, transforms and ports
//!
//! This crate contains the split definitions, sample types, the image and
//! paired transform stages, and the dataset trait implemented by the
//! CelebAMask-HQ and FFHQ adapters.

pub mod dataset;
pub mod domain;
pub mod error;
pub mod ports;
pub mod transforms;

pub use dataset::{check_index, Dataset, SharedRng, Summarize};
pub use domain::{
    MaskedSample, Pixels, PixelsKind, PixelsSummary, SampleReport, Split, SplitScheme,
    CELEBA_BOUNDARIES,
};
pub use error::{DatasetError, Result};
pub use ports::{ImageLister, ProgressEvent, ProgressSink, ResultOutput};
pub use transforms::{PairedTransform, Size, Transform};
