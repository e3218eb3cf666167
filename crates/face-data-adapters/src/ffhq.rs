//! FFHQ (Flickr-Faces-HQ): 70,000 aligned face images.
//!
//! The root directory holds one folder per resolution variant,
//! `images1024x1024/` and `thumbnails128x128/`, each with `00000.png` to
//! `69999.png`. Files 0..60000 form the train split and 60000..70000 the
//! test split.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use face_data_core::dataset::check_index;
use face_data_core::transforms::single::{
    Compose, Normalize, RandomHorizontalFlip, Resize, ToTensor,
};
use face_data_core::{
    Dataset, DatasetError, ImageLister, Pixels, Result, SharedRng, Split, SplitScheme, Transform,
};
use rand::RngCore;
use tracing::{debug, info};

use crate::fs::{file_index, load_image, require_dir, FsImageLister};

/// Resolution variant of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FfhqVersion {
    /// Full 1024x1024 images.
    #[default]
    Images1024x1024,
    /// 128x128 thumbnails.
    Thumbnails128x128,
}

impl FfhqVersion {
    /// Directory name of the variant, also its configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Images1024x1024 => "images1024x1024",
            Self::Thumbnails128x128 => "thumbnails128x128",
        }
    }
}

impl fmt::Display for FfhqVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FfhqVersion {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "images1024x1024" => Ok(Self::Images1024x1024),
            "thumbnails128x128" => Ok(Self::Thumbnails128x128),
            other => Err(DatasetError::InvalidVersion(other.to_string())),
        }
    }
}

/// Named preset for the default transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformType {
    /// Square resize, flip, tensor conversion and normalization to `[-1, 1]`.
    #[default]
    Resize,
    /// No preprocessing; samples are the decoded images.
    None,
}

impl TransformType {
    /// Configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::None => "none",
        }
    }
}

impl fmt::Display for TransformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformType {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "resize" => Ok(Self::Resize),
            "none" => Ok(Self::None),
            other => Err(DatasetError::InvalidTransformType(other.to_string())),
        }
    }
}

/// The FFHQ dataset for one split.
pub struct Ffhq {
    root: PathBuf,
    img_size: u32,
    split: Split,
    version: FfhqVersion,
    transform_type: Option<TransformType>,
    paths: Vec<PathBuf>,
    transform: Option<Box<dyn Transform>>,
    rng: SharedRng,
}

impl fmt::Debug for Ffhq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ffhq")
            .field("root", &self.root)
            .field("img_size", &self.img_size)
            .field("split", &self.split)
            .field("version", &self.version)
            .field("transform_type", &self.transform_type)
            .field("len", &self.paths.len())
            .finish_non_exhaustive()
    }
}

/// Construction options for [`Ffhq`].
pub struct FfhqBuilder {
    root: PathBuf,
    img_size: u32,
    split: Split,
    version: FfhqVersion,
    transform_type: Option<TransformType>,
    transform: Option<Box<dyn Transform>>,
    seed: Option<u64>,
    lister: Arc<dyn ImageLister>,
}

impl FfhqBuilder {
    /// Split to load (default: train).
    #[must_use]
    pub const fn split(mut self, split: Split) -> Self {
        self.split = split;
        self
    }

    /// Resolution variant (default: 1024x1024).
    #[must_use]
    pub const fn version(mut self, version: FfhqVersion) -> Self {
        self.version = version;
        self
    }

    /// Default transform preset; `None` disables preprocessing.
    #[must_use]
    pub const fn transform_type(mut self, transform_type: Option<TransformType>) -> Self {
        self.transform_type = transform_type;
        self
    }

    /// Replaces the default transform.
    #[must_use]
    pub fn transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transform = Some(Box::new(transform));
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

    /// Validates the parameters and layout, then lists the split.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero image size, the `valid`
    /// split, a missing variant directory, or a file name that cannot be
    /// placed in a split.
    pub fn build(self) -> Result<Ffhq> {
        if self.img_size == 0 {
            return Err(DatasetError::InvalidImageSize(self.img_size));
        }
        let range = SplitScheme::FFHQ.range(self.split)?;
        let image_root = self.root.join(self.version.as_str());
        require_dir(&image_root)?;

        let transform = match self.transform {
            Some(t) => Some(t),
            None => Ffhq::default_transform(self.img_size, self.split, self.transform_type)
                .map(|c| Box::new(c) as Box<dyn Transform>),
        };

        let listed = self.lister.list_images(&image_root)?;
        let total = listed.len();
        let paths = match range {
            Some(range) => {
                let mut kept = Vec::new();
                for path in listed {
                    if range.contains(&file_index(&path)?) {
                        kept.push(path);
                    }
                }
                kept
            }
            None => listed,
        };

        debug!("{} of {total} images fall in split {}", paths.len(), self.split);
        info!(
            "Loaded FFHQ {} {} split: {} samples from {}",
            self.version,
            self.split,
            paths.len(),
            self.root.display()
        );

        Ok(Ffhq {
            root: self.root,
            img_size: self.img_size,
            split: self.split,
            version: self.version,
            transform_type: self.transform_type,
            paths,
            transform,
            rng: SharedRng::new(self.seed),
        })
    }
}

impl Ffhq {
    /// Starts building a dataset rooted at `root` with target size `img_size`.
    #[must_use]
    pub fn builder(root: impl Into<PathBuf>, img_size: u32) -> FfhqBuilder {
        FfhqBuilder {
            root: root.into(),
            img_size,
            split: Split::Train,
            version: FfhqVersion::default(),
            transform_type: Some(TransformType::default()),
            transform: None,
            seed: None,
            lister: Arc::new(FsImageLister::recursive()),
        }
    }

    /// Builds a dataset with the default `resize` transform.
    ///
    /// # Errors
    ///
    /// See [`FfhqBuilder::build`].
    pub fn new(
        root: impl Into<PathBuf>,
        img_size: u32,
        split: Split,
        version: FfhqVersion,
    ) -> Result<Self> {
        Self::builder(root, img_size)
            .split(split)
            .version(version)
            .build()
    }

    /// The preset pipeline for a transform type, `None` when preprocessing
    /// is disabled.
    ///
    /// `resize`: square resize to `img_size`, horizontal flip (p = 0.5 on
    /// train and all, 0 otherwise), tensor conversion, normalization with
    /// mean and std 0.5.
    #[must_use]
    pub fn default_transform(
        img_size: u32,
        split: Split,
        transform_type: Option<TransformType>,
    ) -> Option<Compose> {
        match transform_type? {
            TransformType::Resize => {
                let flip_p = if split.is_augmented() { 0.5 } else { 0.0 };
                Some(
                    Compose::default()
                        .then(Resize::square(img_size))
                        .then(RandomHorizontalFlip::new(flip_p))
                        .then(ToTensor)
                        .then(Normalize::symmetric()),
                )
            }
            TransformType::None => None,
        }
    }

    /// The dataset root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target image size.
    #[must_use]
    pub const fn img_size(&self) -> u32 {
        self.img_size
    }

    /// Resolution variant.
    #[must_use]
    pub const fn version(&self) -> FfhqVersion {
        self.version
    }

    /// Transform preset, `None` when disabled.
    #[must_use]
    pub const fn transform_type(&self) -> Option<TransformType> {
        self.transform_type
    }

    /// Path of sample `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::IndexOutOfRange`] if `index >= len()`.
    pub fn path(&self, index: usize) -> Result<&Path> {
        check_index(index, self.paths.len())?;
        Ok(&self.paths[index])
    }
}

impl Dataset for Ffhq {
    type Item = Pixels;

    fn name(&self) -> &'static str {
        SplitScheme::FFHQ.dataset()
    }

    fn split(&self) -> Split {
        self.split
    }

    fn len(&self) -> usize {
        self.paths.len()
    }

    fn paths(&self, index: usize) -> Result<Vec<PathBuf>> {
        Ok(vec![self.path(index)?.to_path_buf()])
    }

    fn get_with_rng(&self, index: usize, rng: &mut dyn RngCore) -> Result<Pixels> {
        let image = Pixels::Image(load_image(self.path(index)?)?);
        match &self.transform {
            Some(t) => t.apply(image, rng),
            None => Ok(image),
        }
    }

    fn rng(&self) -> &SharedRng {
        &self.rng
    }
}
