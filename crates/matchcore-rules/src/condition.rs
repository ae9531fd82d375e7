//! Rule condition trees and their interpreter.

use serde::{Deserialize, Serialize};

use matchcore_core::{FactContext, FactPath, FieldValue, Result};

/// Leaf comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
    /// Fact equals the condition value.
    Eq,
    /// Fact is one of the listed condition values.
    In,
    /// Fact resolves to a collection that contains the condition value.
    Contains,
    /// Numeric comparisons against the condition value.
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A rule condition.
///
/// `All`/`Any` combine children with short-circuit semantics; a `Leaf`
/// resolves its fact path against the current context and compares. A leaf
/// over a missing path evaluates to false, never an error; a structurally
/// malformed path is a configuration error caught by [`ConditionTree::validate`]
/// at rule-load time.
///
/// # Example
///
/// ```
/// use matchcore_rules::{ConditionOp, ConditionTree};
/// use matchcore_core::FieldValue;
///
/// let cond = ConditionTree::All {
///     all: vec![
///         ConditionTree::leaf("required.seniority", ConditionOp::Eq, FieldValue::text("staff")),
///         ConditionTree::leaf("skills", ConditionOp::Contains, FieldValue::text("kubernetes")),
///     ],
/// };
/// assert!(cond.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionTree {
    /// True when every child is true. Empty `all` is vacuously true.
    All { all: Vec<ConditionTree> },
    /// True when at least one child is true. Empty `any` is false.
    Any { any: Vec<ConditionTree> },
    /// A single fact comparison.
    Leaf {
        path: String,
        op: ConditionOp,
        value: FieldValue,
    },
}

impl ConditionTree {
    /// Convenience constructor for a leaf.
    pub fn leaf(path: impl Into<String>, op: ConditionOp, value: FieldValue) -> Self {
        ConditionTree::Leaf {
            path: path.into(),
            op,
            value,
        }
    }

    /// Validates every leaf path in the tree.
    ///
    /// # Errors
    ///
    /// Returns `MatchCoreError::Config` for the first malformed path.
    pub fn validate(&self) -> Result<()> {
        match self {
            ConditionTree::All { all } => all.iter().try_for_each(ConditionTree::validate),
            ConditionTree::Any { any } => any.iter().try_for_each(ConditionTree::validate),
            ConditionTree::Leaf { path, .. } => FactPath::parse(path).map(|_| ()),
        }
    }

    /// Evaluates the tree against the current fact context.
    ///
    /// Paths were validated at load time; a path that fails to parse here
    /// is treated as missing and the leaf is false.
    pub fn evaluate(&self, ctx: &FactContext) -> bool {
        match self {
            ConditionTree::All { all } => all.iter().all(|c| c.evaluate(ctx)),
            ConditionTree::Any { any } => any.iter().any(|c| c.evaluate(ctx)),
            ConditionTree::Leaf { path, op, value } => {
                let Ok(path) = FactPath::parse(path) else {
                    return false;
                };
                let Some(actual) = ctx.resolve(&path) else {
                    return false;
                };
                evaluate_leaf(&actual, *op, value)
            }
        }
    }

    /// Provenance keys of the facts a satisfied leaf reads, used to build
    /// derivation chains for the effects of a firing rule.
    pub(crate) fn support_keys(&self, ctx: &FactContext, out: &mut Vec<String>) {
        match self {
            ConditionTree::All { all } => all.iter().for_each(|c| c.support_keys(ctx, out)),
            ConditionTree::Any { any } => any.iter().for_each(|c| c.support_keys(ctx, out)),
            ConditionTree::Leaf { path, value, .. } => {
                if self.evaluate(ctx) {
                    if let Ok(path) = FactPath::parse(path) {
                        if let Some(key) = path.provenance_key(value.as_text()) {
                            if !out.contains(&key) {
                                out.push(key);
                            }
                        }
                    }
                }
            }
        }
    }
}

fn evaluate_leaf(actual: &FieldValue, op: ConditionOp, expected: &FieldValue) -> bool {
    match op {
        ConditionOp::Eq => actual == expected,
        ConditionOp::In => match (expected, actual) {
            (FieldValue::List(allowed), FieldValue::Text(s)) => allowed.iter().any(|v| v == s),
            _ => false,
        },
        ConditionOp::Contains => match (actual, expected) {
            (FieldValue::List(items), FieldValue::Text(s)) => items.iter().any(|v| v == s),
            _ => false,
        },
        ConditionOp::Gt | ConditionOp::Gte | ConditionOp::Lt | ConditionOp::Lte => {
            let (Some(a), Some(b)) = (actual.as_number(), expected.as_number()) else {
                return false;
            };
            match op {
                ConditionOp::Gt => a > b,
                ConditionOp::Gte => a >= b,
                ConditionOp::Lt => a < b,
                ConditionOp::Lte => a <= b,
                _ => unreachable!(),
            }
        }
    }
}
