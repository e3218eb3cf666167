//! Synthetic images and on-disk dataset trees for testing.

use std::io;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use tempfile::TempDir;

/// Colors used to render label masks, indexed by class.
pub const PALETTE: [[u8; 3]; 8] = [
    [0, 0, 0],
    [204, 0, 0],
    [76, 153, 0],
    [204, 204, 0],
    [51, 51, 255],
    [204, 0, 204],
    [0, 255, 255],
    [255, 204, 204],
];

/// Builder for creating synthetic test images.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// An RGB "face" whose red channel encodes `id`, with green and blue
    /// ramps across the width and height.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn face(width: u32, height: u32, id: u64) -> DynamicImage {
        let red = (id % 256) as u8;
        let img = RgbImage::from_fn(width, height, |x, y| {
            let green = (255 * x / width.max(1)) as u8;
            let blue = (255 * y / height.max(1)) as u8;
            Rgb([red, green, blue])
        });
        DynamicImage::ImageRgb8(img)
    }

    /// A single-channel label mask of `classes` vertical bands, class 0 on the left.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn label_mask(width: u32, height: u32, classes: u8) -> DynamicImage {
        let classes = u32::from(classes.max(1));
        let img = GrayImage::from_fn(width, height, |x, _| {
            Luma([(x * classes / width.max(1)) as u8])
        });
        DynamicImage::ImageLuma8(img)
    }

    /// Renders a label mask with [`PALETTE`].
    #[must_use]
    pub fn color_mask(labels: &DynamicImage) -> DynamicImage {
        let labels = labels.to_luma8();
        let img = RgbImage::from_fn(labels.width(), labels.height(), |x, y| {
            let class = usize::from(labels.get_pixel(x, y).0[0]);
            Rgb(PALETTE[class % PALETTE.len()])
        });
        DynamicImage::ImageRgb8(img)
    }
}

fn save(img: &DynamicImage, path: &Path) -> io::Result<()> {
    let format = ImageFormat::from_path(path).map_err(io::Error::other)?;
    img.save_with_format(path, format).map_err(io::Error::other)
}

/// A temporary dataset directory, removed on drop.
pub struct DatasetTree {
    dir: TempDir,
}

impl DatasetTree {
    /// Root of the tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes raw bytes at `relative`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_file(&self, relative: impl AsRef<Path>, contents: &[u8]) -> io::Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Writes an image at `relative`, format chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be encoded or written.
    pub fn write_image(
        &self,
        relative: impl AsRef<Path>,
        img: &DynamicImage,
    ) -> io::Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        save(img, &path)?;
        Ok(path)
    }

    /// Removes a file or directory under the tree.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing exists at `relative`.
    pub fn remove(&self, relative: impl AsRef<Path>) -> io::Result<()> {
        let path = self.dir.path().join(relative);
        if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        }
    }
}

/// Builds a CelebAMask-HQ style tree: three image directories plus the
/// mapping table.
pub struct CelebAMaskTreeBuilder {
    orig_indices: Vec<u64>,
    files: Option<Vec<u64>>,
    size: u32,
    classes: u8,
}

impl CelebAMaskTreeBuilder {
    /// Mapping table rows; row `i` maps file `i` to `orig_indices[i]`.
    #[must_use]
    pub fn new(orig_indices: Vec<u64>) -> Self {
        Self {
            orig_indices,
            files: None,
            size: 16,
            classes: 4,
        }
    }

    /// File indices to write (default: one per mapping row).
    #[must_use]
    pub fn files(mut self, files: Vec<u64>) -> Self {
        self.files = Some(files);
        self
    }

    /// Side length of the square images (default 16).
    #[must_use]
    pub const fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Number of label classes in the masks (default 4).
    #[must_use]
    pub const fn classes(mut self, classes: u8) -> Self {
        self.classes = classes;
        self
    }

    /// Writes the tree into a fresh temporary directory.
    ///
    /// Images are JPEG, masks are PNG so label values survive encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn build(self) -> io::Result<DatasetTree> {
        let tree = DatasetTree {
            dir: TempDir::new()?,
        };

        let mut table = String::from("idx orig_idx orig_file\n");
        for (row, orig) in self.orig_indices.iter().enumerate() {
            table.push_str(&format!("{row} {orig} {}.jpg\n", orig + 1));
        }
        tree.write_file("CelebA-HQ-to-CelebA-mapping.txt", table.as_bytes())?;

        let files = self
            .files
            .unwrap_or_else(|| (0..self.orig_indices.len() as u64).collect());
        let mask = SyntheticImageBuilder::label_mask(self.size, self.size, self.classes);
        let color = SyntheticImageBuilder::color_mask(&mask);
        for idx in files {
            let face = SyntheticImageBuilder::face(self.size, self.size, idx);
            tree.write_image(format!("CelebA-HQ-img/{idx}.jpg"), &face)?;
            tree.write_image(format!("CelebAMask-HQ-mask/{idx}.png"), &mask)?;
            tree.write_image(format!("CelebAMask-HQ-mask-color/{idx}.png"), &color)?;
        }
        // Empty directories still have to exist.
        for dir in ["CelebA-HQ-img", "CelebAMask-HQ-mask", "CelebAMask-HQ-mask-color"] {
            std::fs::create_dir_all(tree.path().join(dir))?;
        }
        Ok(tree)
    }
}

/// Builds an FFHQ style tree with one resolution directory.
pub struct FfhqTreeBuilder {
    version_dir: String,
    files: Vec<u64>,
    width: u32,
    height: u32,
    sharded: bool,
}

impl FfhqTreeBuilder {
    /// Tree with images `files` (written as `{:05}.png`) under `version_dir`.
    #[must_use]
    pub fn new(version_dir: impl Into<String>, files: Vec<u64>) -> Self {
        Self {
            version_dir: version_dir.into(),
            files,
            width: 16,
            height: 16,
            sharded: false,
        }
    }

    /// Places each image in a 1000-image subfolder (`01000/01234.png`), the
    /// layout of the official release.
    #[must_use]
    pub const fn sharded(mut self) -> Self {
        self.sharded = true;
        self
    }

    /// Image dimensions (default 16x16).
    #[must_use]
    pub const fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Writes the tree into a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn build(self) -> io::Result<DatasetTree> {
        let tree = DatasetTree {
            dir: TempDir::new()?,
        };
        std::fs::create_dir_all(tree.path().join(&self.version_dir))?;
        for idx in self.files {
            let face = SyntheticImageBuilder::face(self.width, self.height, idx);
            let relative = if self.sharded {
                format!("{}/{:05}/{idx:05}.png", self.version_dir, idx / 1000 * 1000)
            } else {
                format!("{}/{idx:05}.png", self.version_dir)
            };
            tree.write_image(relative, &face)?;
        }
        Ok(tree)
    }
}
