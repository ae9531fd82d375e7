//! Testable constraint types.
//!
//! A decomposed hiring request is a list of [`TestableConstraint`] values.
//! Constraints are pure value objects: removing one from a subset never
//! changes the meaning of the others, which is what makes divide-and-conquer
//! conflict diagnosis sound.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A field or fact value.
///
/// Shared between request facts, derived facts, constraint values and
/// relaxation suggestions. Numbers use [`Decimal`] so relaxation
/// multipliers scale values exactly.
///
/// # Example
///
/// ```
/// use matchcore_core::FieldValue;
///
/// let budget = FieldValue::number(100_000);
/// let zones = FieldValue::List(vec!["Eastern".into(), "Central".into()]);
/// assert_ne!(budget, zones);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free-form text (canonical ids, enum values, skill names).
    Text(String),
    /// Exact decimal number.
    Number(Decimal),
    /// Ordered list of text values (timezone sets, enum ladders).
    List(Vec<String>),
}

impl FieldValue {
    /// Creates a number value from an integer.
    pub fn number(n: impl Into<Decimal>) -> Self {
        FieldValue::Number(n.into())
    }

    /// Creates a text value.
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Returns the number if this is a numeric value.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list if this is a list value.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Number(n) => write!(f, "{}", n.normalize()),
            FieldValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

// Config files carry values as bare TOML/YAML scalars, so deserialization
// goes through an untagged shadow enum that accepts integers and floats.
impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use rust_decimal::prelude::FromPrimitive;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
            List(Vec<String>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(FieldValue::Number(Decimal::from(n))),
            Raw::Float(x) => Decimal::from_f64(x)
                .map(FieldValue::Number)
                .ok_or_else(|| serde::de::Error::custom(format!("unrepresentable number {x}"))),
            Raw::Text(s) => Ok(FieldValue::Text(s)),
            Raw::List(items) => Ok(FieldValue::List(items)),
        }
    }
}

/// Comparison operator of a testable constraint.
///
/// The operator decides both how the count query is rendered and in which
/// direction a numeric constraint relaxes (ceilings relax upward, floors
/// downward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// Candidate attribute equals the value.
    Eq,
    /// Candidate attribute is at most the value (ceiling).
    Lte,
    /// Candidate attribute is at least the value (floor).
    Gte,
    /// Candidate attribute is one of the listed values.
    In,
    /// Candidate attribute collection contains the value (skills, domains).
    Has,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::Lte => "<=",
            CompareOp::Gte => ">=",
            CompareOp::In => "in",
            CompareOp::Has => "has",
        };
        write!(f, "{s}")
    }
}

/// An independently testable atomic constraint.
///
/// Each semantically distinct requirement of a resolved request becomes
/// exactly one constraint with an id that is unique within its
/// decomposition. Skill constraints carry the minimum proficiency as the
/// second element of a list value.
///
/// # Example
///
/// ```
/// use matchcore_core::{CompareOp, FieldValue, TestableConstraint};
///
/// let c = TestableConstraint::new(
///     "req:budget",
///     "budget",
///     CompareOp::Lte,
///     FieldValue::number(100_000),
///     "Maximum budget of 100000",
/// );
/// assert_eq!(c.id, "req:budget");
/// assert!(c.origin_rule.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestableConstraint {
    /// Stable id, unique within one decomposition.
    pub id: String,
    /// Candidate field the constraint filters on.
    pub field: String,
    /// Comparison operator.
    pub op: CompareOp,
    /// Constraint value.
    pub value: FieldValue,
    /// Human-readable description for explanations.
    pub description: String,
    /// Id of the inference rule that derived this constraint, if any.
    #[serde(default)]
    pub origin_rule: Option<String>,
}

impl TestableConstraint {
    /// Creates a new constraint with no originating rule.
    pub fn new(
        id: impl Into<String>,
        field: impl Into<String>,
        op: CompareOp,
        value: FieldValue,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            op,
            value,
            description: description.into(),
            origin_rule: None,
        }
    }

    /// Sets the originating rule id.
    pub fn with_origin_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.origin_rule = Some(rule_id.into());
        self
    }
}
