//! Immutable three channel image.
//!
//! Pixels are always held in RGB order internally; the order the caller
//! supplied them in is remembered so results can be handed back in the same
//! layout.

use ::image::{Rgb, RgbImage};

use super::source::{ColorOrder, ImageSource};
use crate::error::Result;

/// Three channel 8-bit image.
///
/// An `Image` is never mutated in place. Geometry transforms and the attack
/// engine produce new images that inherit the source color order.
///
/// # Examples
/// ```rust
/// use tog_core::image::{ColorOrder, Image, ImageSource};
///
/// let source = ImageSource::array(vec![0u8; 4 * 6 * 3], 4, 6, ColorOrder::Bgr);
/// let image = Image::load(source).unwrap();
/// assert_eq!(image.shape(), (4, 6));
/// assert_eq!(image.order(), ColorOrder::Bgr);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pixels: RgbImage,
    order: ColorOrder,
}

impl Image {
    /// Load an image from any supported source.
    ///
    /// # Errors
    /// Returns `InvalidImageSource` when the source cannot be decoded or has
    /// empty dimensions.
    pub fn load(source: ImageSource) -> Result<Self> {
        let (pixels, order) = source.decode()?;
        Ok(Self { pixels, order })
    }

    /// Wrap RGB pixels.
    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self {
            pixels,
            order: ColorOrder::Rgb,
        }
    }

    /// Create an image filled with one RGB color.
    pub fn filled(height: usize, width: usize, rgb: [u8; 3]) -> Self {
        Self::from_rgb(RgbImage::from_pixel(width as u32, height as u32, Rgb(rgb)))
    }

    /// Same pixels, reported in a different caller color order.
    pub fn with_order(mut self, order: ColorOrder) -> Self {
        self.order = order;
        self
    }

    /// New image with the given pixels and this image's color order.
    pub(crate) fn derive(&self, pixels: RgbImage) -> Self {
        Self {
            pixels,
            order: self.order,
        }
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.pixels.height() as usize
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.pixels.width() as usize
    }

    /// `(height, width)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// RGB pixels.
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Color order of the source this image came from.
    pub fn order(&self) -> ColorOrder {
        self.order
    }

    /// Pixel at `(row, col)` in RGB order.
    pub fn rgb_at(&self, row: usize, col: usize) -> [u8; 3] {
        self.pixels.get_pixel(col as u32, row as u32).0
    }

    /// Interleaved `height x width x 3` bytes in the source color order.
    pub fn to_raw(&self) -> Vec<u8> {
        match self.order {
            ColorOrder::Rgb => self.pixels.as_raw().clone(),
            ColorOrder::Bgr => self
                .pixels
                .pixels()
                .flat_map(|px| ColorOrder::Bgr.swap(px.0))
                .collect(),
        }
    }

    /// Consume the image and return its RGB pixels.
    pub fn into_rgb(self) -> RgbImage {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_shape() {
        let image = Image::filled(3, 5, [1, 2, 3]);
        assert_eq!(image.shape(), (3, 5));
        assert_eq!(image.rgb_at(2, 4), [1, 2, 3]);
        assert_eq!(image.order(), ColorOrder::Rgb);
    }

    #[test]
    fn test_to_raw_keeps_source_order() {
        let raw = vec![10, 20, 30, 40, 50, 60];
        let image = Image::load(ImageSource::array(raw.clone(), 1, 2, ColorOrder::Bgr)).unwrap();
        assert_eq!(image.rgb_at(0, 0), [30, 20, 10]);
        assert_eq!(image.to_raw(), raw);
    }

    #[test]
    fn test_derive_inherits_order() {
        let image = Image::filled(2, 2, [0, 0, 0]).with_order(ColorOrder::Bgr);
        let derived = image.derive(RgbImage::new(4, 4));
        assert_eq!(derived.order(), ColorOrder::Bgr);
        assert_eq!(derived.shape(), (4, 4));
    }
}
