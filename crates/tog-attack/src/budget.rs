//! Iteration budgets.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tog_core::{Result, TogError};

/// How many steps an attack may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IterationBudget {
    /// Exactly this many steps, no early stop.
    Fixed(usize),
    /// Stop as soon as the loss drops below the attack's threshold, up to the
    /// configured ceiling.
    #[default]
    UntilConverged,
}

impl IterationBudget {
    /// Wire keyword for [`IterationBudget::UntilConverged`].
    pub const MIN: &'static str = "min";

    /// Parse the untyped JSON form: `"min"`, a non-negative integer or an
    /// integer string.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => s.parse(),
            Value::Number(n) => n
                .as_u64()
                .map(|n| Self::Fixed(n as usize))
                .ok_or_else(|| {
                    TogError::iteration_spec(format!(
                        "expected a non-negative integer, got {}",
                        n
                    ))
                }),
            other => Err(TogError::iteration_spec(format!(
                "expected \"min\" or a non-negative integer, got {}",
                other
            ))),
        }
    }

    /// Parse a form field, where `-1` stands for `"min"`.
    pub fn from_form_value(value: &str) -> Result<Self> {
        match value.trim() {
            "-1" => Ok(Self::UntilConverged),
            other => other.parse(),
        }
    }

    /// Number of steps the engine runs at most.
    pub fn limit(&self, ceiling: usize) -> usize {
        match *self {
            Self::Fixed(n) => n,
            Self::UntilConverged => ceiling,
        }
    }

    /// Whether the convergence threshold may end the run early.
    pub fn stops_early(&self) -> bool {
        matches!(self, Self::UntilConverged)
    }
}

impl FromStr for IterationBudget {
    type Err = TogError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(Self::MIN) {
            return Ok(Self::UntilConverged);
        }
        s.parse::<usize>()
            .map(Self::Fixed)
            .map_err(|_| {
                TogError::iteration_spec(format!(
                    "expected \"min\" or a non-negative integer, got {:?}",
                    s
                ))
            })
    }
}

impl fmt::Display for IterationBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{}", n),
            Self::UntilConverged => f.write_str(Self::MIN),
        }
    }
}

impl From<usize> for IterationBudget {
    fn from(n: usize) -> Self {
        Self::Fixed(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit() {
        assert_eq!(IterationBudget::Fixed(7).limit(1000), 7);
        assert_eq!(IterationBudget::UntilConverged.limit(1000), 1000);
        assert!(!IterationBudget::Fixed(7).stops_early());
        assert!(IterationBudget::UntilConverged.stops_early());
    }

    #[test]
    fn test_display_roundtrip() {
        for budget in [
            IterationBudget::Fixed(0),
            IterationBudget::Fixed(12),
            IterationBudget::UntilConverged,
        ] {
            assert_eq!(budget.to_string().parse::<IterationBudget>().unwrap(), budget);
        }
    }
}
