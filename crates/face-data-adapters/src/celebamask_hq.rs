//! CelebAMask-HQ: face images with aligned label and color masks.
//!
//! Expected layout under the root directory:
//!
//! ```text
//! root
//! ├── CelebA-HQ-img/            0.jpg ... 29999.jpg
//! ├── CelebAMask-HQ-mask/       0.png ... 29999.png
//! ├── CelebAMask-HQ-mask-color/ 0.png ... 29999.png
//! └── CelebA-HQ-to-CelebA-mapping.txt
//! ```
//!
//! Splits follow the original CelebA partition, reached through the mapping
//! table: 24,183 train, 2,993 valid and 2,824 test samples on the full data.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use face_data_core::dataset::check_index;
use face_data_core::{
    Dataset, DatasetError, ImageLister, MaskedSample, PairedTransform, Result, SharedRng, Split,
    SplitScheme,
};
use image::DynamicImage;
use rand::RngCore;
use tracing::{debug, info};

use crate::fs::{file_index, load_image, require_dir, FsImageLister};
use crate::mapping::IndexMapping;

/// Face image directory.
pub const IMAGE_DIR: &str = "CelebA-HQ-img";
/// Label mask directory.
pub const MASK_DIR: &str = "CelebAMask-HQ-mask";
/// Color mask directory.
pub const MASK_COLOR_DIR: &str = "CelebAMask-HQ-mask-color";
/// Mapping table file.
pub const MAPPING_FILE: &str = "CelebA-HQ-to-CelebA-mapping.txt";

/// Paths of one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePaths {
    /// Face image.
    pub image: PathBuf,
    /// Label mask.
    pub mask: PathBuf,
    /// Color mask.
    pub mask_color: PathBuf,
}

/// The CelebAMask-HQ dataset for one split.
pub struct CelebAMaskHq {
    root: PathBuf,
    split: Split,
    samples: Vec<TriplePaths>,
    transforms: Option<Box<dyn PairedTransform>>,
    rng: SharedRng,
}

impl std::fmt::Debug for CelebAMaskHq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CelebAMaskHq")
            .field("root", &self.root)
            .field("split", &self.split)
            .field("len", &self.samples.len())
            .field("has_transforms", &self.transforms.is_some())
            .finish_non_exhaustive()
    }
}

/// Construction options for [`CelebAMaskHq`].
pub struct CelebAMaskHqBuilder {
    root: PathBuf,
    split: Split,
    transforms: Option<Box<dyn PairedTransform>>,
    seed: Option<u64>,
    lister: Arc<dyn ImageLister>,
}

impl CelebAMaskHqBuilder {
    /// Split to load (default: train).
    #[must_use]
    pub const fn split(mut self, split: Split) -> Self {
        self.split = split;
        self
    }

    /// Paired transform applied to every sample.
    #[must_use]
    pub fn transforms<T: PairedTransform + 'static>(mut self, transforms: T) -> Self {
        self.transforms = Some(Box::new(transforms));
        self
    }

    /// Seed for the dataset's random source.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the filesystem lister.
    #[must_use]
    pub fn lister(mut self, lister: Arc<dyn ImageLister>) -> Self {
        self.lister = lister;
        self
    }

    /// Validates the layout, reads the mapping table and lists the split.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a directory or the mapping file is
    /// missing, the file lists are misaligned, or a file name cannot be placed
    /// in a split.
    pub fn build(self) -> Result<CelebAMaskHq> {
        let image_root = self.root.join(IMAGE_DIR);
        let mask_root = self.root.join(MASK_DIR);
        let mask_color_root = self.root.join(MASK_COLOR_DIR);
        let mapping_file = self.root.join(MAPPING_FILE);
        require_dir(&image_root)?;
        require_dir(&mask_root)?;
        require_dir(&mask_color_root)?;
        let mapping = IndexMapping::from_file(&mapping_file)?;

        let images = self.lister.list_images(&image_root)?;
        let masks = self.lister.list_images(&mask_root)?;
        let mask_colors = self.lister.list_images(&mask_color_root)?;
        check_aligned(&images, &masks, MASK_DIR)?;
        check_aligned(&images, &mask_colors, MASK_COLOR_DIR)?;
        let total = images.len();

        let range = SplitScheme::CELEBA.range(self.split)?;
        let mut samples = Vec::new();
        for ((image, mask), mask_color) in images.into_iter().zip(masks).zip(mask_colors) {
            if let Some(range) = &range {
                let orig_idx = mapping.orig_idx(file_index(&image)?)?;
                if !range.contains(&orig_idx) {
                    continue;
                }
            }
            samples.push(TriplePaths {
                image,
                mask,
                mask_color,
            });
        }

        debug!("{} of {total} triples fall in split {}", samples.len(), self.split);
        info!(
            "Loaded CelebAMask-HQ {} split: {} samples from {}",
            self.split,
            samples.len(),
            self.root.display()
        );

        Ok(CelebAMaskHq {
            root: self.root,
            split: self.split,
            samples,
            transforms: self.transforms,
            rng: SharedRng::new(self.seed),
        })
    }
}

/// Position-by-position comparison of file stems.
fn check_aligned(images: &[PathBuf], others: &[PathBuf], dir: &str) -> Result<()> {
    if images.len() != others.len() {
        return Err(DatasetError::Misaligned(format!(
            "{IMAGE_DIR} has {} images but {dir} has {}",
            images.len(),
            others.len()
        )));
    }
    let mismatch = images
        .iter()
        .zip(others)
        .find(|(a, b)| a.file_stem() != b.file_stem());
    match mismatch {
        Some((a, b)) => Err(DatasetError::Misaligned(format!(
            "{} does not match {}",
            a.display(),
            b.display()
        ))),
        None => Ok(()),
    }
}

impl CelebAMaskHq {
    /// Starts building a dataset rooted at `root`.
    #[must_use]
    pub fn builder(root: impl Into<PathBuf>) -> CelebAMaskHqBuilder {
        CelebAMaskHqBuilder {
            root: root.into(),
            split: Split::Train,
            transforms: None,
            seed: None,
            lister: Arc::new(FsImageLister::recursive()),
        }
    }

    /// Builds a dataset for `split` with default options.
    ///
    /// # Errors
    ///
    /// See [`CelebAMaskHqBuilder::build`].
    pub fn new(root: impl Into<PathBuf>, split: Split) -> Result<Self> {
        Self::builder(root).split(split).build()
    }

    /// The dataset root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of sample `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::IndexOutOfRange`] if `index >= len()`.
    pub fn triple_paths(&self, index: usize) -> Result<&TriplePaths> {
        check_index(index, self.samples.len())?;
        Ok(&self.samples[index])
    }

    /// Decodes sample `index` without applying transforms.
    ///
    /// The image and color mask are converted to RGB, the label mask to
    /// single-channel gray.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or a file fails to decode.
    pub fn load(&self, index: usize) -> Result<MaskedSample> {
        let paths = self.triple_paths(index)?;
        let image = load_image(&paths.image)?.to_rgb8();
        let mask = load_image(&paths.mask)?.to_luma8();
        let mask_color = load_image(&paths.mask_color)?.to_rgb8();
        Ok(MaskedSample::from_images(
            DynamicImage::ImageRgb8(image),
            DynamicImage::ImageLuma8(mask),
            DynamicImage::ImageRgb8(mask_color),
        ))
    }
}

impl Dataset for CelebAMaskHq {
    type Item = MaskedSample;

    fn name(&self) -> &'static str {
        SplitScheme::CELEBA.dataset()
    }

    fn split(&self) -> Split {
        self.split
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn paths(&self, index: usize) -> Result<Vec<PathBuf>> {
        let paths = self.triple_paths(index)?;
        Ok(vec![
            paths.image.clone(),
            paths.mask.clone(),
            paths.mask_color.clone(),
        ])
    }

    fn get_with_rng(&self, index: usize, rng: &mut dyn RngCore) -> Result<MaskedSample> {
        let sample = self.load(index)?;
        match &self.transforms {
            Some(t) => t.apply(sample, rng),
            None => Ok(sample),
        }
    }

    fn rng(&self) -> &SharedRng {
        &self.rng
    }
}
