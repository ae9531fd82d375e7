//! Rule definitions.
//!
//! Rules are immutable configuration, loaded once per process and shared
//! read-only across requests.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matchcore_core::{FieldValue, Result};

use crate::condition::ConditionTree;

/// What kind of requirement a firing rule derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Adds a hard requirement (required map or skill set).
    DerivedFilter,
    /// Adds a soft preference (preferred map).
    DerivedBoost,
}

/// The effect applied when a rule fires.
///
/// A `target_field` of `"skills"` unions `target_value` (a skill id) into
/// the skill set; any other field writes the property map of the dimension
/// selected by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEffect {
    pub kind: EffectKind,
    pub target_field: String,
    pub target_value: FieldValue,
    /// Shown to the user when explaining why the requirement was added.
    pub rationale: String,
    /// Relative weight for boost effects; ignored for filters.
    #[serde(default)]
    pub boost_strength: Option<Decimal>,
}

impl RuleEffect {
    /// Whether this effect targets the skill set rather than a property.
    pub fn is_skill_target(&self) -> bool {
        self.target_field == "skills"
    }
}

/// A single inference rule: condition -> effect, with a priority for
/// deterministic evaluation order.
///
/// # Example
///
/// ```
/// use matchcore_rules::{ConditionOp, ConditionTree, EffectKind, RuleDefinition, RuleEffect};
/// use matchcore_core::FieldValue;
///
/// let rule = RuleDefinition {
///     id: "staff-needs-mentoring".into(),
///     name: "Staff engineers must mentor".into(),
///     priority: 10,
///     condition: ConditionTree::leaf(
///         "required.seniority",
///         ConditionOp::Eq,
///         FieldValue::text("staff"),
///     ),
///     effect: RuleEffect {
///         kind: EffectKind::DerivedFilter,
///         target_field: "skills".into(),
///         target_value: FieldValue::text("mentoring"),
///         rationale: "Staff roles carry mentoring responsibility".into(),
///         boost_strength: None,
///     },
/// };
/// assert!(rule.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,
    pub name: String,
    /// Higher priority rules are evaluated first within a pass.
    #[serde(default)]
    pub priority: i32,
    pub condition: ConditionTree,
    pub effect: RuleEffect,
}

impl RuleDefinition {
    /// Validates the rule's condition paths.
    ///
    /// # Errors
    ///
    /// Returns `MatchCoreError::Config` for a malformed path; this is
    /// fatal at load time, never at request time.
    pub fn validate(&self) -> Result<()> {
        self.condition.validate().map_err(|e| {
            matchcore_core::MatchCoreError::Config(format!("rule '{}': {e}", self.id))
        })
    }
}
