//! Detection loss against attack targets.
//!
//! The loss pulls the detector toward the target: no objects for a
//! vanishing attack, the requested boxes for a fabrication attack.

use burn::tensor::{activation, backend::Backend, Tensor, TensorData};
use serde::{Deserialize, Serialize};
use tog_core::{OracleError, Target};

use crate::detector::Detections;

/// Weights of the three loss terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossGains {
    pub objectness: f32,
    pub bbox: f32,
    pub class: f32,
}

impl Default for LossGains {
    fn default() -> Self {
        Self {
            objectness: 1.0,
            bbox: 7.5,
            class: 0.5,
        }
    }
}

/// Detection loss against an attack target.
///
/// Each non-degenerate target box is assigned to the grid cell holding its
/// center. Objectness is binary cross entropy over every cell, so an empty
/// assignment (the vanishing target) drives all objectness down. Box and
/// class terms only cover assigned cells.
#[derive(Debug, Clone, Default)]
pub struct DetectionLoss {
    gains: LossGains,
}

/// Target rasterized onto the prediction grid.
struct GridTarget {
    objectness: Vec<f32>,
    boxes: Vec<f32>,
    classes: Vec<f32>,
    assigned: usize,
}

impl DetectionLoss {
    pub fn new(gains: LossGains) -> Self {
        Self { gains }
    }

    pub fn gains(&self) -> LossGains {
        self.gains
    }

    /// Loss of `detections` against `target`, shape `[1]`.
    ///
    /// # Errors
    /// `ShapeMismatch` if the output is not a single image with at least one
    /// class channel, `InvalidTarget` for a class the head does not predict.
    pub fn forward<B: Backend>(
        &self,
        detections: &Detections<B>,
        target: &Target,
    ) -> Result<Tensor<B, 1>, OracleError> {
        let [batch, channels, h, w] = detections.raw().dims();
        let class_count = detections.class_count();
        if batch != 1 || class_count == 0 {
            return Err(OracleError::ShapeMismatch {
                expected: vec![1, channels.max(6), h, w],
                actual: vec![batch, channels, h, w],
            });
        }

        let grid = rasterize(target, class_count, (h, w))?;
        let device = detections.raw().device();
        let plane = |values: Vec<f32>, c: usize| {
            Tensor::<B, 4>::from_data(TensorData::new(values, [1, c, h, w]), &device)
        };

        let obj_target = plane(grid.objectness, 1);
        let box_target = plane(grid.boxes, 4);
        let cls_target = plane(grid.classes, class_count);
        let denom = grid.assigned.max(1) as f32;

        let obj = bce_with_logits(detections.objectness_logits(), obj_target.clone()).mean();

        let box_err = (activation::sigmoid(detections.box_logits()) - box_target).powf_scalar(2.0);
        let bbox = (box_err * obj_target.clone()).sum() / denom;

        let cls_err = bce_with_logits(detections.class_logits(), cls_target);
        let class = (cls_err * obj_target).sum() / denom;

        tracing::trace!("Rasterized {} target boxes onto a {}x{} grid", grid.assigned, h, w);

        Ok(obj * self.gains.objectness + bbox * self.gains.bbox + class * self.gains.class)
    }
}

fn bce_with_logits<B: Backend>(logits: Tensor<B, 4>, target: Tensor<B, 4>) -> Tensor<B, 4> {
    let positive = activation::log_sigmoid(logits.clone()) * target.clone();
    let negative = activation::log_sigmoid(logits.neg()) * target.neg().add_scalar(1.0);
    (positive + negative).neg()
}

fn rasterize(
    target: &Target,
    class_count: usize,
    (h, w): (usize, usize),
) -> Result<GridTarget, OracleError> {
    let plane = h * w;
    let mut grid = GridTarget {
        objectness: vec![0.0; plane],
        boxes: vec![0.0; 4 * plane],
        classes: vec![0.0; class_count * plane],
        assigned: 0,
    };

    for label in target.labels() {
        if label.class >= class_count {
            return Err(OracleError::invalid_target(format!(
                "class {} but the detector predicts {} classes",
                label.class, class_count
            )));
        }
        if label.bbox.is_degenerate() {
            continue;
        }

        let row = cell_index(label.bbox.y, h);
        let col = cell_index(label.bbox.x, w);
        let cell = row * w + col;

        if grid.objectness[cell] == 0.0 {
            grid.assigned += 1;
        }
        grid.objectness[cell] = 1.0;
        for (k, v) in label.bbox.to_array().into_iter().enumerate() {
            grid.boxes[k * plane + cell] = v;
        }
        grid.classes[label.class * plane + cell] = 1.0;
    }

    Ok(grid)
}

fn cell_index(coord: f32, cells: usize) -> usize {
    let scaled = (coord.clamp(0.0, 1.0) * cells as f32) as usize;
    scaled.min(cells - 1)
}
