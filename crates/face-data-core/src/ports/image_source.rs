//! Image listing port for discovering dataset files.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Port for enumerating the image files of a dataset directory.
pub trait ImageLister: Send + Sync {
    /// Returns the image files in `dir`, sorted in a deterministic order.
    ///
    /// Every call with the same directory contents must return the same order;
    /// split filtering and triple alignment depend on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn list_images(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}
