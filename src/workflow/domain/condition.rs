//! Step conditions and their evaluation against an execution context.
//!
//! A step carries a list of conditions with AND semantics. A condition
//! referencing a field absent from the context is false — the step is
//! skipped, never an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use super::context::{ExecutionContext, display_value};

/// Comparison operator applied between a context field and a condition value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    /// Field equals the comparison value.
    Equals,

    /// Field differs from the comparison value.
    NotEquals,

    /// Field orders strictly after the comparison value.
    GreaterThan,

    /// Field orders strictly before the comparison value.
    LessThan,

    /// Field contains the comparison value (substring or array membership).
    Contains,
}

impl ConditionOperator {
    /// Returns the operator as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Contains => "contains",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an invalid operator string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConditionOperatorError(String);

impl fmt::Display for ParseConditionOperatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid condition operator: '{}'", self.0)
    }
}

impl std::error::Error for ParseConditionOperatorError {}

impl TryFrom<&str> for ConditionOperator {
    type Error = ParseConditionOperatorError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            "greater_than" => Ok(Self::GreaterThan),
            "less_than" => Ok(Self::LessThan),
            "contains" => Ok(Self::Contains),
            _ => Err(ParseConditionOperatorError(s.to_owned())),
        }
    }
}

/// One predicate over the execution context.
///
/// # Examples
///
/// ```
/// use barragan::workflow::domain::{Condition, ConditionOperator, ExecutionContext};
///
/// let condition = Condition::new("priority", ConditionOperator::Equals, "high");
/// let context = ExecutionContext::new().with("priority", "high");
///
/// assert!(condition.holds(&context));
/// assert!(!condition.holds(&ExecutionContext::new()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Context field inspected by the condition.
    pub field: String,

    /// Comparison operator.
    pub operator: ConditionOperator,

    /// Comparison value.
    pub value: Value,
}

impl Condition {
    /// Creates a condition.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Evaluates the condition against a context.
    ///
    /// A missing field is false, not an error.
    #[must_use]
    pub fn holds(&self, context: &ExecutionContext) -> bool {
        let Some(actual) = context.get(&self.field) else {
            return false;
        };

        match self.operator {
            ConditionOperator::Equals => values_equal(actual, &self.value),
            ConditionOperator::NotEquals => !values_equal(actual, &self.value),
            ConditionOperator::GreaterThan => {
                compare_values(actual, &self.value) == Some(Ordering::Greater)
            }
            ConditionOperator::LessThan => {
                compare_values(actual, &self.value) == Some(Ordering::Less)
            }
            ConditionOperator::Contains => value_contains(actual, &self.value),
        }
    }
}

/// Evaluates a condition list with AND semantics.
///
/// An empty list always holds.
#[must_use]
pub fn all_hold(conditions: &[Condition], context: &ExecutionContext) -> bool {
    conditions.iter().all(|condition| condition.holds(context))
}

/// Loose equality: direct JSON equality, falling back to the rendered
/// string forms so `"3"` and `3` compare equal.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    actual == expected || display_value(actual) == display_value(expected)
}

/// Numeric comparison when both sides parse as numbers, lexical otherwise.
fn compare_values(actual: &Value, expected: &Value) -> Option<Ordering> {
    if let (Some(lhs), Some(rhs)) = (as_number(actual), as_number(expected)) {
        return lhs.partial_cmp(&rhs);
    }
    Some(display_value(actual).cmp(&display_value(expected)))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn value_contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(text) => text.contains(&display_value(expected)),
        Value::Array(items) => items
            .iter()
            .any(|item| values_equal(item, expected)),
        _ => false,
    }
}
