//! Raw detector output and its decoding into boxes.

use burn::tensor::{backend::Backend, Tensor};
use tog_core::{BoundingBox, OracleError};

use super::network::BOX_CHANNELS;

/// One decoded detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub class: usize,
    /// Objectness times the best class probability.
    pub score: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    /// Human-readable label such as `person (87%)`.
    ///
    /// Returns `None` when `class` has no entry in `names`.
    pub fn label(&self, names: &[String]) -> Option<String> {
        names
            .get(self.class)
            .map(|name| format!("{} ({:.0}%)", name, self.score * 100.0))
    }
}

/// Per-cell logits of a [`GridDetector`](super::GridDetector), `[N, 5 + C, h, w]`.
///
/// Channel 0 is objectness, channels 1..5 are the box and the rest are class
/// logits.
#[derive(Debug, Clone)]
pub struct Detections<B: Backend> {
    raw: Tensor<B, 4>,
    input: [usize; 2],
}

impl<B: Backend> Detections<B> {
    pub fn new(raw: Tensor<B, 4>, input: [usize; 2]) -> Self {
        Self { raw, input }
    }

    pub fn raw(&self) -> &Tensor<B, 4> {
        &self.raw
    }

    /// `(height, width)` of the image the detector saw.
    pub fn input_shape(&self) -> (usize, usize) {
        (self.input[0], self.input[1])
    }

    /// `(rows, cols)` of the prediction grid.
    pub fn grid(&self) -> (usize, usize) {
        let [_, _, h, w] = self.raw.dims();
        (h, w)
    }

    /// Number of class channels, zero if the head is narrower than the box
    /// channels.
    pub fn class_count(&self) -> usize {
        self.raw.dims()[1].saturating_sub(BOX_CHANNELS)
    }

    pub fn objectness_logits(&self) -> Tensor<B, 4> {
        self.channels(0..1)
    }

    pub fn box_logits(&self) -> Tensor<B, 4> {
        self.channels(1..BOX_CHANNELS)
    }

    pub fn class_logits(&self) -> Tensor<B, 4> {
        self.channels(BOX_CHANNELS..self.raw.dims()[1])
    }

    fn channels(&self, range: std::ops::Range<usize>) -> Tensor<B, 4> {
        let [n, _, h, w] = self.raw.dims();
        self.raw.clone().slice([0..n, range, 0..h, 0..w])
    }

    /// Decode the first image of the batch into detections scoring at least
    /// `threshold`, highest score first.
    pub fn decode(&self, threshold: f32) -> Result<Vec<Detection>, OracleError> {
        let [_, channels, h, w] = self.raw.dims();
        if channels <= BOX_CHANNELS {
            return Err(OracleError::ShapeMismatch {
                expected: vec![BOX_CHANNELS + 1],
                actual: vec![channels],
            });
        }

        let values = self
            .raw
            .clone()
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| OracleError::backend(format!("{:?}", e)))?;

        let plane = h * w;
        let at = |c: usize, cell: usize| sigmoid(values[c * plane + cell]);

        let mut detections = Vec::new();
        for cell in 0..plane {
            let objectness = at(0, cell);
            let (class, class_prob) = (BOX_CHANNELS..channels)
                .map(|c| (c - BOX_CHANNELS, at(c, cell)))
                .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

            let score = objectness * class_prob;
            if score >= threshold {
                detections.push(Detection {
                    class,
                    score,
                    bbox: BoundingBox::new(at(1, cell), at(2, cell), at(3, cell), at(4, cell)),
                });
            }
        }

        detections.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(detections)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
