//! Filesystem adapter for listing and decoding dataset images.

use face_data_core::{DatasetError, ImageLister, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff", "webp"];

/// Filesystem image lister.
///
/// Lists the image files inside a directory, sorted by path. The datasets
/// use the recursive form, since FFHQ ships in 1000-image subfolders.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageLister {
    recursive: bool,
}

impl FsImageLister {
    /// Creates a lister that only looks at the top level of a directory.
    #[must_use]
    pub const fn new() -> Self {
        Self { recursive: false }
    }

    /// Creates a lister that also descends into subdirectories.
    #[must_use]
    pub const fn recursive() -> Self {
        Self { recursive: true }
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                if is_supported_image(&path) {
                    files.push(path);
                } else {
                    warn!("Skipping non-image file: {}", path.display());
                }
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files)?;
            }
        }
        Ok(())
    }
}

impl ImageLister for FsImageLister {
    fn list_images(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(DatasetError::MissingDirectory(dir.to_path_buf()));
        }
        let mut files = Vec::new();
        self.collect_from_dir(dir, &mut files)?;
        files.sort();
        debug!("Found {} image files in {}", files.len(), dir.display());
        Ok(files)
    }
}

/// Checks if a path has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Parses the integer index carried by a file name (`00042.png` -> 42).
pub fn file_index(path: &Path) -> Result<u64> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| DatasetError::InvalidFileName(path.to_path_buf()))
}

/// Decodes an image, attaching the path to codec errors.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| DatasetError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Fails with [`DatasetError::MissingDirectory`] unless `path` is a directory.
pub fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(DatasetError::MissingDirectory(path.to_path_buf()))
    }
}

/// Fails with [`DatasetError::MissingFile`] unless `path` is a regular file.
pub fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DatasetError::MissingFile(path.to_path_buf()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("test.jpg")));
        assert!(is_supported_image(Path::new("test.JPEG")));
        assert!(is_supported_image(Path::new("test.png")));
        assert!(is_supported_image(Path::new("test.webp")));
        assert!(!is_supported_image(Path::new("test.txt")));
        assert!(!is_supported_image(Path::new("mapping")));
    }

    #[test]
    fn test_file_index() {
        assert_eq!(file_index(Path::new("/a/00042.png")).ok(), Some(42));
        assert_eq!(file_index(Path::new("60000.jpg")).ok(), Some(60_000));
        assert!(matches!(
            file_index(Path::new("face_01.png")),
            Err(DatasetError::InvalidFileName(_))
        ));
        assert!(file_index(Path::new("-3.png")).is_err());
    }

    #[test]
    fn test_recursive_listing_descends() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("01000")).unwrap();
        std::fs::write(dir.path().join("00003.png"), b"").unwrap();
        std::fs::write(dir.path().join("01000/01001.png"), b"").unwrap();
        std::fs::write(dir.path().join("01000/notes.txt"), b"").unwrap();

        let top = FsImageLister::new().list_images(dir.path()).unwrap();
        assert_eq!(top, vec![dir.path().join("00003.png")]);

        let all = FsImageLister::recursive().list_images(dir.path()).unwrap();
        assert_eq!(
            all,
            vec![dir.path().join("00003.png"), dir.path().join("01000/01001.png")]
        );
    }

    #[test]
    fn test_missing_directory() {
        let err = FsImageLister::new()
            .list_images(Path::new("/nonexistent/face-data"))
            .err();
        assert!(matches!(err, Some(DatasetError::MissingDirectory(_))));
    }
}
