//! Attack requests as they arrive from a service boundary.

use serde_json::Value;
use tog_core::{AttackType, BoxSpec, Result};

use crate::budget::IterationBudget;

/// Everything one attack invocation needs besides the image and the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackRequest {
    pub attack_type: AttackType,
    pub budget: IterationBudget,
    /// Ignored by vanishing attacks.
    pub boxes: BoxSpec,
}

impl AttackRequest {
    pub fn new(attack_type: AttackType, budget: IterationBudget) -> Self {
        Self {
            attack_type,
            budget,
            boxes: BoxSpec::default(),
        }
    }

    pub fn vanishing(budget: IterationBudget) -> Self {
        Self::new(AttackType::Vanishing, budget)
    }

    pub fn fabrication(budget: IterationBudget, boxes: BoxSpec) -> Self {
        Self::new(AttackType::Fabrication, budget).with_boxes(boxes)
    }

    pub fn with_boxes(mut self, boxes: BoxSpec) -> Self {
        self.boxes = boxes;
        self
    }

    /// Parse untyped request fields.
    ///
    /// The iteration spec is checked first so a bad budget is reported
    /// before anything else.
    ///
    /// # Errors
    /// `InvalidIterationSpec` or `InvalidAttackSpec`.
    pub fn parse(attack_type: &str, n_iters: &Value, boxes: &Value) -> Result<Self> {
        let budget = IterationBudget::from_json(n_iters)?;
        let attack_type = attack_type.parse()?;
        let boxes = BoxSpec::from_json(boxes)?;
        Ok(Self {
            attack_type,
            budget,
            boxes,
        })
    }
}
