//! Image sources accepted at the attack boundary.

use std::path::PathBuf;

use ::image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TogError};

/// Channel order of interleaved pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Blue, green, red (OpenCV-style buffers).
    Bgr,
}

impl ColorOrder {
    /// Reorder one interleaved pixel between this order and RGB.
    ///
    /// The swap is its own inverse, so the same call converts in both
    /// directions.
    pub fn swap(self, pixel: [u8; 3]) -> [u8; 3] {
        match self {
            Self::Rgb => pixel,
            Self::Bgr => [pixel[2], pixel[1], pixel[0]],
        }
    }
}

/// Where an attack image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An image file on disk.
    Path(PathBuf),
    /// Encoded image bytes (PNG, JPEG), e.g. an uploaded file.
    Encoded(Vec<u8>),
    /// Interleaved `height x width x 3` pixels.
    Array {
        data: Vec<u8>,
        height: usize,
        width: usize,
        order: ColorOrder,
    },
    /// An already decoded image.
    Decoded(DynamicImage),
}

impl ImageSource {
    /// Create a path source.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Create an interleaved array source.
    pub fn array(data: Vec<u8>, height: usize, width: usize, order: ColorOrder) -> Self {
        Self::Array {
            data,
            height,
            width,
            order,
        }
    }

    /// Decode the source into RGB pixels plus the order the caller uses.
    pub(crate) fn decode(self) -> Result<(RgbImage, ColorOrder)> {
        let (pixels, order) = match self {
            Self::Path(path) => {
                let decoded = ::image::open(&path).map_err(|e| {
                    TogError::image_source(format!("{}: {}", path.display(), e))
                })?;
                (decoded.to_rgb8(), ColorOrder::Rgb)
            }
            Self::Encoded(bytes) => {
                let decoded = ::image::load_from_memory(&bytes)
                    .map_err(|e| TogError::image_source(e.to_string()))?;
                (decoded.to_rgb8(), ColorOrder::Rgb)
            }
            Self::Array {
                mut data,
                height,
                width,
                order,
            } => {
                let expected = height * width * 3;
                if data.len() != expected {
                    return Err(TogError::image_source(format!(
                        "array holds {} bytes, expected {} for {}x{}x3",
                        data.len(),
                        expected,
                        height,
                        width
                    )));
                }
                if order == ColorOrder::Bgr {
                    for px in data.chunks_exact_mut(3) {
                        px.swap(0, 2);
                    }
                }
                let pixels = RgbImage::from_raw(width as u32, height as u32, data)
                    .ok_or_else(|| TogError::image_source("array does not fit its dimensions"))?;
                (pixels, order)
            }
            Self::Decoded(decoded) => (decoded.to_rgb8(), ColorOrder::Rgb),
        };

        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(TogError::image_source(format!(
                "image has empty dimensions {}x{}",
                pixels.height(),
                pixels.width()
            )));
        }
        Ok((pixels, order))
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        Self::Decoded(image)
    }
}

impl From<RgbImage> for ImageSource {
    fn from(image: RgbImage) -> Self {
        Self::Decoded(DynamicImage::ImageRgb8(image))
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}
