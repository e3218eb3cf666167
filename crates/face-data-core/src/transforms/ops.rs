//! Image and tensor operations shared by the transform stages.

// Pixel dimensions are u32 in `image` and usize in `candle`.
#![allow(clippy::cast_possible_truncation)]

use candle_core::{Device, Tensor};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::domain::Pixels;
use crate::error::{DatasetError, Result};

/// Filter used for smooth (anti-aliased) resizing of photographs.
pub const SMOOTH_FILTER: FilterType = FilterType::Triangle;

/// Target size of a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// Match the shorter edge to this length, keeping the aspect ratio.
    Shorter(u32),
    /// Resize to exactly this height and width.
    Exact {
        /// Output height.
        height: u32,
        /// Output width.
        width: u32,
    },
}

impl Size {
    /// A square `size x size` target.
    #[must_use]
    pub const fn square(size: u32) -> Self {
        Self::Exact {
            height: size,
            width: size,
        }
    }

    /// Output `(width, height)` for an input of the given dimensions.
    #[must_use]
    pub fn output_dims(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::Exact { height, width } => (width, height),
            Self::Shorter(size) => {
                let (short, long) = if width <= height {
                    (width, height)
                } else {
                    (height, width)
                };
                if short == size || short == 0 {
                    return (width, height);
                }
                let new_long = (u64::from(size) * u64::from(long) / u64::from(short)) as u32;
                if width <= height {
                    (size, new_long)
                } else {
                    (new_long, size)
                }
            }
        }
    }

    fn validate(self) -> Result<()> {
        let positive = match self {
            Self::Shorter(size) => size > 0,
            Self::Exact { height, width } => height > 0 && width > 0,
        };
        if positive {
            Ok(())
        } else {
            Err(DatasetError::Transform(format!(
                "resize target must be positive, got {self:?}"
            )))
        }
    }
}

/// Resizes with a smooth interpolating filter.
pub fn resize_smooth(img: &DynamicImage, size: Size) -> Result<DynamicImage> {
    resize_with(img, size, SMOOTH_FILTER)
}

/// Resizes with nearest-neighbour sampling. Output pixels are copies of input
/// pixels, so label values are never blended.
pub fn resize_nearest(img: &DynamicImage, size: Size) -> Result<DynamicImage> {
    resize_with(img, size, FilterType::Nearest)
}

fn resize_with(img: &DynamicImage, size: Size, filter: FilterType) -> Result<DynamicImage> {
    size.validate()?;
    let (width, height) = img.dimensions();
    let (new_width, new_height) = size.output_dims(width, height);
    if (new_width, new_height) == (width, height) {
        return Ok(img.clone());
    }
    Ok(img.resize_exact(new_width, new_height, filter))
}

/// Mirrors an image or tensor left to right.
///
/// Tensors are flipped along their last dimension.
pub fn hflip(pixels: Pixels) -> Result<Pixels> {
    match pixels {
        Pixels::Image(img) => Ok(Pixels::Image(img.fliph())),
        Pixels::Tensor(t) => {
            let rank = t.rank();
            if rank == 0 {
                return Err(DatasetError::Transform(
                    "cannot flip a scalar tensor".to_string(),
                ));
            }
            let width = t.dim(rank - 1)?;
            let reversed: Vec<u32> = (0..width as u32).rev().collect();
            let index = Tensor::from_vec(reversed, width, t.device())?;
            Ok(Pixels::Tensor(t.index_select(&index, rank - 1)?))
        }
    }
}

/// Converts an image to a `C x H x W` `f32` tensor with values in `[0, 1]`.
///
/// The channel count follows the image color type: 1 for gray, 2 for
/// gray + alpha, 3 for RGB, 4 for RGBA.
pub fn to_float_tensor(img: &DynamicImage) -> Result<Tensor> {
    let (width, height) = img.dimensions();
    let channels = usize::from(img.color().channel_count());
    let interleaved: Vec<f32> = match channels {
        1 => img.to_luma32f().into_raw(),
        2 => img.to_luma_alpha32f().into_raw(),
        3 => img.to_rgb32f().into_raw(),
        _ => img.to_rgba32f().into_raw(),
    };
    let channels = channels.min(4);
    let hwc = Tensor::from_vec(
        interleaved,
        (height as usize, width as usize, channels),
        &Device::Cpu,
    )?;
    Ok(hwc.permute((2, 0, 1))?.contiguous()?)
}

/// Converts a label mask to an `H x W` `i64` tensor holding the raw gray levels.
pub fn to_label_tensor(img: &DynamicImage) -> Result<Tensor> {
    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    let labels: Vec<i64> = luma.into_raw().into_iter().map(i64::from).collect();
    Ok(Tensor::from_vec(
        labels,
        (height as usize, width as usize),
        &Device::Cpu,
    )?)
}

/// Checks normalization statistics before any tensor is seen.
///
/// Both lists must be non-empty and finite, `std` must not contain a zero,
/// and per-channel lists must agree in length (a single value broadcasts).
pub fn check_stats(mean: &[f32], std: &[f32]) -> Result<()> {
    if mean.is_empty() || std.is_empty() {
        return Err(DatasetError::InvalidNormalization(
            "mean and std must not be empty".to_string(),
        ));
    }
    if mean.iter().chain(std).any(|v| !v.is_finite()) {
        return Err(DatasetError::InvalidNormalization(
            "mean and std must be finite".to_string(),
        ));
    }
    if std.iter().any(|s| *s == 0.0) {
        return Err(DatasetError::InvalidNormalization(
            "std contains a zero".to_string(),
        ));
    }
    if mean.len() > 1 && std.len() > 1 && mean.len() != std.len() {
        return Err(DatasetError::InvalidNormalization(format!(
            "mean has {} values but std has {}",
            mean.len(),
            std.len()
        )));
    }
    Ok(())
}

/// Applies `(t - mean) / std` per channel to a `C x H x W` float tensor.
///
/// `mean` and `std` hold either one value per channel or a single value used
/// for every channel.
pub fn normalize(t: &Tensor, mean: &[f32], std: &[f32]) -> Result<Tensor> {
    if t.rank() != 3 {
        return Err(DatasetError::Transform(format!(
            "normalize expects a C x H x W tensor, got shape {:?}",
            t.dims()
        )));
    }
    if !t.dtype().is_float() {
        return Err(DatasetError::Transform(format!(
            "normalize expects a floating point tensor, got {}",
            t.dtype().as_str()
        )));
    }
    if std.iter().any(|s| *s == 0.0) {
        return Err(DatasetError::Transform(
            "normalize std contains a zero".to_string(),
        ));
    }
    let channels = t.dim(0)?;
    let mean = per_channel(mean, channels, "mean")?;
    let std = per_channel(std, channels, "std")?;
    let mean = Tensor::from_vec(mean, (channels, 1, 1), t.device())?.to_dtype(t.dtype())?;
    let std = Tensor::from_vec(std, (channels, 1, 1), t.device())?.to_dtype(t.dtype())?;
    Ok(t.broadcast_sub(&mean)?.broadcast_div(&std)?)
}

fn per_channel(values: &[f32], channels: usize, what: &str) -> Result<Vec<f32>> {
    match values {
        [single] => Ok(vec![*single; channels]),
        v if v.len() == channels => Ok(v.to_vec()),
        v => Err(DatasetError::Transform(format!(
            "normalize {what} has {} values for {channels} channels",
            v.len()
        ))),
    }
}
