//! Target construction.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bbox::{BoundingBox, LabeledBox};
use super::box_spec::BoxSpec;
use crate::error::{Result, TogError};

/// Upper bound of the random box count when no boxes are given.
pub const MAX_RANDOM_BOXES: usize = 4;

static VANISHING_LABELS: [LabeledBox; 1] = [LabeledBox::new(0, BoundingBox::zero())];

/// Goal of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackType {
    /// Make real objects disappear.
    Vanishing,
    /// Make objects appear that are not there.
    Fabrication,
}

impl fmt::Display for AttackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vanishing => f.write_str("vanishing"),
            Self::Fabrication => f.write_str("fabrication"),
        }
    }
}

impl FromStr for AttackType {
    type Err = TogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vanishing" => Ok(Self::Vanishing),
            "fabrication" => Ok(Self::Fabrication),
            other => Err(TogError::attack_spec(format!("unknown attack type '{}'", other))),
        }
    }
}

/// Ground truth the detector is optimized towards.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A single degenerate zero box of class 0: nothing should be found.
    Vanishing,
    /// Ordered boxes that should be found.
    Fabrication(Vec<LabeledBox>),
}

impl Target {
    /// Attack type this target drives.
    pub fn attack_type(&self) -> AttackType {
        match self {
            Self::Vanishing => AttackType::Vanishing,
            Self::Fabrication(_) => AttackType::Fabrication,
        }
    }

    /// Labeled boxes as handed to a detection loss.
    pub fn labels(&self) -> &[LabeledBox] {
        match self {
            Self::Vanishing => &VANISHING_LABELS[..],
            Self::Fabrication(labels) => labels.as_slice(),
        }
    }

    /// Boxes in label order.
    pub fn boxes(&self) -> Vec<BoundingBox> {
        self.labels().iter().map(|l| l.bbox).collect()
    }

    /// Class indices in label order.
    pub fn classes(&self) -> Vec<usize> {
        self.labels().iter().map(|l| l.class).collect()
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels().len()
    }

    /// Whether there are no labels. Only an empty fabrication target is.
    pub fn is_empty(&self) -> bool {
        self.labels().is_empty()
    }
}

/// Build the target for one attack invocation.
///
/// # Arguments
/// * `attack_type` - Vanishing targets ignore `spec`
/// * `class_count` - Number of classes the detector knows; bounds random
///   classes and validates explicit ones
/// * `spec` - Where fabrication boxes come from
/// * `rng` - Source of random boxes and classes
///
/// # Errors
/// `InvalidAttackSpec` for class indices outside the detector's classes,
/// `InvalidConfiguration` when random classes are requested from a detector
/// without classes.
pub fn build_target<R: Rng + ?Sized>(
    attack_type: AttackType,
    class_count: usize,
    spec: &BoxSpec,
    rng: &mut R,
) -> Result<Target> {
    if attack_type == AttackType::Vanishing {
        return Ok(Target::Vanishing);
    }

    let labels = match spec {
        BoxSpec::Random => {
            let count = rng.gen_range(1..=MAX_RANDOM_BOXES);
            random_labels(count, class_count, rng)?
        }
        BoxSpec::Count(count) => random_labels(*count, class_count, rng)?,
        BoxSpec::Boxes(boxes) => boxes.iter().map(|&bbox| LabeledBox::new(0, bbox)).collect(),
        BoxSpec::Labeled(labels) => {
            if let Some(bad) = labels.iter().find(|l| l.class >= class_count) {
                return Err(TogError::attack_spec(format!(
                    "class {} is outside the detector's {} classes",
                    bad.class, class_count
                )));
            }
            labels.clone()
        }
    };

    tracing::debug!("Built fabrication target with {} boxes", labels.len());
    Ok(Target::Fabrication(labels))
}

fn random_labels<R: Rng + ?Sized>(
    count: usize,
    class_count: usize,
    rng: &mut R,
) -> Result<Vec<LabeledBox>> {
    if count > 0 && class_count == 0 {
        return Err(TogError::invalid_configuration(
            "cannot sample random classes from a detector without classes",
        ));
    }

    Ok((0..count)
        .map(|_| {
            let bbox = BoundingBox::new(rng.gen(), rng.gen(), rng.gen(), rng.gen());
            LabeledBox::new(rng.gen_range(0..class_count), bbox)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_attack_type_parse() {
        assert_eq!("vanishing".parse::<AttackType>().unwrap(), AttackType::Vanishing);
        assert_eq!("Fabrication".parse::<AttackType>().unwrap(), AttackType::Fabrication);
        assert!("mislabel".parse::<AttackType>().is_err());
        assert_eq!(AttackType::Fabrication.to_string(), "fabrication");
    }

    #[test]
    fn test_vanishing_labels() {
        let target = Target::Vanishing;
        assert_eq!(target.len(), 1);
        assert_eq!(target.classes(), vec![0]);
        assert_eq!(target.boxes(), vec![BoundingBox::zero()]);
    }

    #[test]
    fn test_random_classes_need_classes() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = build_target(AttackType::Fabrication, 0, &BoxSpec::Count(2), &mut rng);
        assert!(matches!(result, Err(TogError::InvalidConfiguration(_))));

        // zero boxes need no classes
        let empty = build_target(AttackType::Fabrication, 0, &BoxSpec::Count(0), &mut rng).unwrap();
        assert!(empty.is_empty());
    }
}
