//! Geometry state recorded by the letterbox transform.

use serde::{Deserialize, Serialize};

/// Border added around the resized image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Padding {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Padding {
    /// Split a total vertical and horizontal padding across both sides.
    ///
    /// Odd totals put the extra pixel on the bottom/right side. The ±0.1
    /// offsets keep `round` away from exact `.5` ties.
    pub fn split(total_h: f64, total_w: f64) -> Self {
        let (dh, dw) = (total_h / 2.0, total_w / 2.0);
        Self {
            top: (dh - 0.1).round().max(0.0) as usize,
            bottom: (dh + 0.1).round().max(0.0) as usize,
            left: (dw - 0.1).round().max(0.0) as usize,
            right: (dw + 0.1).round().max(0.0) as usize,
        }
    }

    /// Split integer totals, floor half first.
    pub fn split_even(total_h: usize, total_w: usize) -> Self {
        Self {
            top: total_h / 2,
            bottom: total_h - total_h / 2,
            left: total_w / 2,
            right: total_w - total_w / 2,
        }
    }

    /// Total rows added.
    pub fn vertical(&self) -> usize {
        self.top + self.bottom
    }

    /// Total columns added.
    pub fn horizontal(&self) -> usize {
        self.left + self.right
    }

    /// Whether no border is added at all.
    pub fn is_empty(&self) -> bool {
        self.vertical() == 0 && self.horizontal() == 0
    }
}

/// Everything needed to map between an original image and its letterboxed
/// tensor.
///
/// All shapes are `(height, width)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryState {
    /// Source image shape.
    pub original: (usize, usize),
    /// Scale applied per axis. Equal unless stretching.
    pub ratio: (f64, f64),
    /// Shape of the resized image before padding.
    pub unpadded: (usize, usize),
    /// Border around the resized image.
    pub padding: Padding,
    /// Requested target shape.
    pub target: (usize, usize),
    /// Stride used for alignment.
    pub stride: usize,
}

impl GeometryState {
    /// Shape of the padded tensor.
    pub fn padded(&self) -> (usize, usize) {
        (
            self.unpadded.0 + self.padding.vertical(),
            self.unpadded.1 + self.padding.horizontal(),
        )
    }

    /// Whether the source has to be resampled.
    pub fn needs_resize(&self) -> bool {
        self.unpadded != self.original
    }

    /// Recover geometry from the original and padded shapes alone.
    ///
    /// Used when a tensor does not have the shape the configured letterbox
    /// would have produced: the scale is taken as the smaller of the two
    /// per-axis ratios and padding is assumed to be centered.
    pub fn from_shapes(original: (usize, usize), padded: (usize, usize)) -> Self {
        let (oh, ow) = original;
        let (ph, pw) = padded;
        let r = (ph as f64 / oh as f64).min(pw as f64 / ow as f64);
        let unpadded = (
            ((oh as f64 * r).round_ties_even() as usize).min(ph),
            ((ow as f64 * r).round_ties_even() as usize).min(pw),
        );
        Self {
            original,
            ratio: (r, r),
            unpadded,
            padding: Padding::split_even(ph - unpadded.0, pw - unpadded.1),
            target: padded,
            stride: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_even_total() {
        let pad = Padding::split(10.0, 0.0);
        assert_eq!((pad.top, pad.bottom), (5, 5));
        assert_eq!((pad.left, pad.right), (0, 0));
    }

    #[test]
    fn test_split_odd_total_favors_bottom_right() {
        let pad = Padding::split(43.0, 7.0);
        assert_eq!((pad.top, pad.bottom), (21, 22));
        assert_eq!((pad.left, pad.right), (3, 4));
    }

    #[test]
    fn test_split_matches_integer_split() {
        for total in 0..64usize {
            let a = Padding::split(total as f64, total as f64);
            let b = Padding::split_even(total, total);
            assert_eq!(a, b, "total {}", total);
        }
    }

    #[test]
    fn test_from_shapes() {
        let state = GeometryState::from_shapes((100, 150), (96, 128));
        assert_eq!(state.unpadded, (85, 128));
        assert_eq!(state.padding.vertical(), 11);
        assert_eq!(state.padded(), (96, 128));
    }
}
