//! Sample types flowing through transform pipelines.

use candle_core::{DType, Tensor};
use image::{ColorType, DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// One member of a sample: a decoded image before tensor conversion, a tensor after.
#[derive(Debug, Clone)]
pub enum Pixels {
    /// Decoded image.
    Image(DynamicImage),
    /// Channel-first tensor (`C x H x W`), or `H x W` for label masks.
    Tensor(Tensor),
}

impl Pixels {
    /// Returns the decoded image, if tensor conversion has not happened yet.
    #[must_use]
    pub const fn as_image(&self) -> Option<&DynamicImage> {
        match self {
            Self::Image(img) => Some(img),
            Self::Tensor(_) => None,
        }
    }

    /// Returns the tensor, if tensor conversion has happened.
    #[must_use]
    pub const fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Self::Image(_) => None,
            Self::Tensor(t) => Some(t),
        }
    }

    /// Consumes into a decoded image.
    pub fn into_image(self) -> Result<DynamicImage> {
        match self {
            Self::Image(img) => Ok(img),
            Self::Tensor(_) => Err(DatasetError::Transform(
                "expected a decoded image, found a tensor".to_string(),
            )),
        }
    }

    /// Consumes into a tensor.
    pub fn into_tensor(self) -> Result<Tensor> {
        match self {
            Self::Image(_) => Err(DatasetError::Transform(
                "expected a tensor, found a decoded image".to_string(),
            )),
            Self::Tensor(t) => Ok(t),
        }
    }

    /// Spatial size as `(width, height)`.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        match self {
            Self::Image(img) => Ok(img.dimensions()),
            Self::Tensor(t) => {
                let rank = t.rank();
                if rank < 2 {
                    return Err(DatasetError::Transform(format!(
                        "tensor of rank {rank} has no spatial dimensions"
                    )));
                }
                let height = t.dim(rank - 2)?;
                let width = t.dim(rank - 1)?;
                Ok((to_u32(width)?, to_u32(height)?))
            }
        }
    }

    /// Shape, dtype and value range, for reporting.
    pub fn summary(&self) -> Result<PixelsSummary> {
        match self {
            Self::Image(img) => {
                let (width, height) = img.dimensions();
                let channels = usize::from(img.color().channel_count());
                // Gray levels are replicated across RGB, so the first three
                // channels cover every color type; alpha only when present.
                let used = if img.color().has_alpha() { 4 } else { 3 };
                let (min, max) = img
                    .to_rgba32f()
                    .pixels()
                    .flat_map(|p| p.0.into_iter().take(used))
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(f64::from(v)), hi.max(f64::from(v)))
                    });
                Ok(PixelsSummary {
                    kind: PixelsKind::Image,
                    shape: vec![height as usize, width as usize, channels],
                    dtype: format!("{:?}", img.color()),
                    min: scale_back(min, img.color()),
                    max: scale_back(max, img.color()),
                })
            }
            Self::Tensor(t) => {
                let values = t.to_dtype(DType::F64)?.flatten_all()?.to_vec1::<f64>()?;
                let (min, max) = values
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                Ok(PixelsSummary {
                    kind: PixelsKind::Tensor,
                    shape: t.dims().to_vec(),
                    dtype: t.dtype().as_str().to_string(),
                    min,
                    max,
                })
            }
        }
    }
}

/// `to_rgba32f` maps integer samples to `[0, 1]`; reports show the raw
/// levels of the image's own bit depth. Float images are left as they are.
fn scale_back(v: f64, color: ColorType) -> f64 {
    let max_level = match color.bytes_per_pixel() / color.channel_count() {
        1 => f64::from(u8::MAX),
        2 => f64::from(u16::MAX),
        _ => return v,
    };
    if v.is_finite() {
        (v * max_level).round()
    } else {
        v
    }
}

fn to_u32(v: usize) -> Result<u32> {
    u32::try_from(v)
        .map_err(|_| DatasetError::Transform(format!("dimension {v} does not fit in u32")))
}

impl From<DynamicImage> for Pixels {
    fn from(img: DynamicImage) -> Self {
        Self::Image(img)
    }
}

impl From<Tensor> for Pixels {
    fn from(t: Tensor) -> Self {
        Self::Tensor(t)
    }
}

/// An aligned image / label mask / color mask triple.
#[derive(Debug, Clone)]
pub struct MaskedSample {
    /// RGB face image.
    pub image: Pixels,
    /// Single-channel label mask holding class indices.
    pub mask: Pixels,
    /// Color-coded rendering of the label mask.
    pub mask_color: Pixels,
}

impl MaskedSample {
    /// Builds a triple from decoded images.
    #[must_use]
    pub fn from_images(image: DynamicImage, mask: DynamicImage, mask_color: DynamicImage) -> Self {
        Self {
            image: Pixels::Image(image),
            mask: Pixels::Image(mask),
            mask_color: Pixels::Image(mask_color),
        }
    }

    /// Splits the triple into its members.
    #[must_use]
    pub fn into_parts(self) -> (Pixels, Pixels, Pixels) {
        (self.image, self.mask, self.mask_color)
    }
}

/// Whether a sample member is still an image or already a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelsKind {
    /// Decoded image.
    Image,
    /// Tensor.
    Tensor,
}

/// Shape and value range of a sample member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixelsSummary {
    /// Image or tensor.
    pub kind: PixelsKind,
    /// `[H, W, C]` for images, tensor dims otherwise.
    pub shape: Vec<usize>,
    /// Color type for images, element dtype for tensors.
    pub dtype: String,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

/// Per-sample record produced when checking a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleReport {
    /// Position within the split.
    pub index: usize,
    /// Source file(s) of the sample.
    pub paths: Vec<String>,
    /// Image (FFHQ) or face image (CelebAMask-HQ).
    pub image: PixelsSummary,
    /// Label mask, masked datasets only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<PixelsSummary>,
    /// Color mask, masked datasets only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_color: Option<PixelsSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use image::{GrayImage, ImageBuffer, Luma};

    #[test]
    fn test_image_summary() {
        let img = GrayImage::from_fn(4, 2, |x, _| Luma([u8::try_from(x).unwrap_or(0) * 10]));
        let summary = Pixels::Image(DynamicImage::ImageLuma8(img))
            .summary()
            .unwrap_or_else(|e| panic!("summary failed: {e}"));
        assert_eq!(summary.kind, PixelsKind::Image);
        assert_eq!(summary.shape, vec![2, 4, 1]);
        assert!((summary.min - 0.0).abs() < f64::EPSILON);
        assert!((summary.max - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sixteen_bit_summary_keeps_levels() {
        let levels = [300_u16, 1_200, 40_000];
        let img = ImageBuffer::from_fn(3, 1, |x, _| Luma([levels[x as usize]]));
        let summary = Pixels::Image(DynamicImage::ImageLuma16(img))
            .summary()
            .unwrap_or_else(|e| panic!("summary failed: {e}"));
        assert_eq!(summary.dtype, "L16");
        assert!((summary.min - 300.0).abs() < f64::EPSILON);
        assert!((summary.max - 40_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tensor_dimensions() {
        let t = Tensor::zeros((3, 5, 7), DType::F32, &Device::Cpu)
            .unwrap_or_else(|e| panic!("tensor: {e}"));
        let pixels = Pixels::Tensor(t);
        assert_eq!(pixels.dimensions().ok(), Some((7, 5)));
        assert!(pixels.as_image().is_none());
    }

    #[test]
    fn test_into_image_rejects_tensor() {
        let t = Tensor::zeros((2, 2), DType::I64, &Device::Cpu)
            .unwrap_or_else(|e| panic!("tensor: {e}"));
        assert!(Pixels::Tensor(t).into_image().is_err());
    }
}
