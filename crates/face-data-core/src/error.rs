//! Error type shared by the dataset crates.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or reading a dataset.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Split name not recognised.
    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    /// Split is valid in general but not offered by this dataset.
    #[error("Split '{split}' is not available for {dataset}")]
    UnsupportedSplit {
        /// Dataset name.
        dataset: &'static str,
        /// Requested split.
        split: String,
    },

    /// Resolution variant name not recognised.
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    /// Transform type name not recognised.
    #[error("Invalid transform_type: {0}")]
    InvalidTransformType(String),

    /// Target image size must be positive.
    #[error("Invalid image size: {0}, must be a positive integer")]
    InvalidImageSize(u32),

    /// A required directory is missing or is not a directory.
    #[error("{} is not an existing directory", .0.display())]
    MissingDirectory(PathBuf),

    /// A required file is missing or is not a regular file.
    #[error("{} is not an existing file", .0.display())]
    MissingFile(PathBuf),

    /// A file name does not carry an integer index.
    #[error("{} does not have an integer file name", .0.display())]
    InvalidFileName(PathBuf),

    /// The mapping table could not be parsed.
    #[error("Invalid mapping table: {0}")]
    InvalidMapping(String),

    /// An index has no row in the mapping table.
    #[error("Index {0} has no entry in the mapping table")]
    MissingMapping(u64),

    /// Parallel file lists disagree.
    #[error("File lists are misaligned: {0}")]
    Misaligned(String),

    /// Indexed access past the end of the dataset.
    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Dataset length.
        len: usize,
    },

    /// The image codec failed to decode a file.
    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        /// File that failed to decode.
        path: PathBuf,
        /// Underlying codec error.
        #[source]
        source: image::ImageError,
    },

    /// Normalization statistics that no input could use.
    #[error("Invalid normalization: {0}")]
    InvalidNormalization(String),

    /// A transform stage received input it cannot handle.
    #[error("Transform failed: {0}")]
    Transform(String),

    /// Tensor operation failed.
    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatasetError {
    /// Whether this error comes from invalid construction parameters or layout,
    /// as opposed to a failure while reading a sample.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSplit(_)
                | Self::UnsupportedSplit { .. }
                | Self::InvalidVersion(_)
                | Self::InvalidTransformType(_)
                | Self::InvalidImageSize(_)
                | Self::MissingDirectory(_)
                | Self::MissingFile(_)
                | Self::InvalidFileName(_)
                | Self::InvalidMapping(_)
                | Self::MissingMapping(_)
                | Self::Misaligned(_)
                | Self::InvalidNormalization(_)
        )
    }
}

/// Result alias used throughout the dataset crates.
pub type Result<T> = std::result::Result<T, DatasetError>;
