//! Face Data Adapters - Filesystem-backed datasets.
//!
//! This crate provides:
//! - A filesystem image lister
//! - The CelebA-HQ to CelebA mapping table reader
//! - The CelebAMask-HQ and FFHQ datasets

pub mod celebamask_hq;
pub mod ffhq;
pub mod fs;
pub mod mapping;

pub use celebamask_hq::{CelebAMaskHq, CelebAMaskHqBuilder, TriplePaths};
pub use ffhq::{Ffhq, FfhqBuilder, FfhqVersion, TransformType};
pub use fs::FsImageLister;
pub use mapping::IndexMapping;
