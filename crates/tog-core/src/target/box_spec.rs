//! Fabrication box specifications.

use serde_json::Value;

use super::bbox::{BoundingBox, LabeledBox};
use crate::error::{Result, TogError};

/// How the boxes of a fabrication attack are chosen.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BoxSpec {
    /// Between one and four random boxes with random classes.
    #[default]
    Random,
    /// Exactly this many random boxes with random classes.
    Count(usize),
    /// Caller boxes without classes. Every box is labeled class 0.
    Boxes(Vec<BoundingBox>),
    /// Caller boxes with explicit classes.
    Labeled(Vec<LabeledBox>),
}

impl BoxSpec {
    /// Parse the untyped form used at service boundaries.
    ///
    /// * `null` → [`BoxSpec::Random`]
    /// * non-negative integer → [`BoxSpec::Count`]
    /// * list of `[x, y, w, h]` rows → [`BoxSpec::Boxes`]
    /// * list of `[class, x, y, w, h]` rows → [`BoxSpec::Labeled`]
    ///
    /// The row arity is taken from the first row and every other row must
    /// match it. An empty list is an empty labeled set.
    ///
    /// # Errors
    /// `InvalidAttackSpec` for any other shape or type.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::Random),
            Value::Number(n) => n
                .as_u64()
                .map(|count| Self::Count(count as usize))
                .ok_or_else(|| {
                    TogError::attack_spec(format!(
                        "box count must be a non-negative integer, got {}",
                        n
                    ))
                }),
            Value::Array(rows) => Self::from_rows(rows),
            other => Err(TogError::attack_spec(format!(
                "expected null, an integer or a list of boxes, got {}",
                other
            ))),
        }
    }

    fn from_rows(rows: &[Value]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::Labeled(Vec::new()));
        };
        let arity = first.as_array().map(Vec::len).ok_or_else(|| {
            TogError::attack_spec(format!("box rows must be lists, got {}", first))
        })?;

        match arity {
            5 => {
                tracing::debug!("Received {} boxes as <class><x><y><w><h> rows", rows.len());
                rows.iter()
                    .enumerate()
                    .map(|(i, row)| {
                        let [class, x, y, w, h] = numeric_row::<5>(i, row)?;
                        Ok(LabeledBox::new(class_index(i, class)?, BoundingBox::new(x, y, w, h)))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Self::Labeled)
            }
            4 => rows
                .iter()
                .enumerate()
                .map(|(i, row)| numeric_row::<4>(i, row).map(BoundingBox::from))
                .collect::<Result<Vec<_>>>()
                .map(Self::Boxes),
            n => Err(TogError::attack_spec(format!(
                "box rows must have 4 or 5 values, got {}",
                n
            ))),
        }
    }

    /// Number of boxes fixed by this spec, if any.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            Self::Random => None,
            Self::Count(n) => Some(*n),
            Self::Boxes(boxes) => Some(boxes.len()),
            Self::Labeled(labels) => Some(labels.len()),
        }
    }
}

impl TryFrom<&Value> for BoxSpec {
    type Error = TogError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_json(value)
    }
}

fn numeric_row<const N: usize>(index: usize, row: &Value) -> Result<[f32; N]> {
    let values = row
        .as_array()
        .filter(|values| values.len() == N)
        .ok_or_else(|| {
            TogError::attack_spec(format!(
                "row {} must be a list of {} numbers, got {}",
                index, N, row
            ))
        })?;

    let mut out = [0.0f32; N];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = value
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                TogError::attack_spec(format!("row {} holds non-numeric {}", index, value))
            })?
            as f32;
    }
    Ok(out)
}

fn class_index(index: usize, value: f32) -> Result<usize> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(TogError::attack_spec(format!(
            "row {} class must be a non-negative integer, got {}",
            index, value
        )));
    }
    Ok(value as usize)
}
