//! Test support utilities for face-data.
//!
//! Provides mocks, synthetic image builders, and temporary on-disk dataset
//! trees for testing the dataset adapters and the CLI.
//!
//! # Example
//!
//! ```
//! use face_data_test_support::{CelebAMaskTreeBuilder, SyntheticImageBuilder};
//!
//! // A face and its label mask
//! let face = SyntheticImageBuilder::face(32, 32, 7);
//! let mask = SyntheticImageBuilder::label_mask(32, 32, 4);
//!
//! // A three-sample CelebAMask-HQ tree, one sample per split
//! let tree = CelebAMaskTreeBuilder::new(vec![0, 170_000, 190_000]).build().unwrap();
//! assert!(tree.path().join("CelebA-HQ-to-CelebA-mapping.txt").is_file());
//! ```

mod builders;
mod mocks;

pub use builders::{
    CelebAMaskTreeBuilder, DatasetTree, FfhqTreeBuilder, SyntheticImageBuilder, PALETTE,
};
pub use mocks::{MockImageLister, MockProgressSink, MockResultOutput};
