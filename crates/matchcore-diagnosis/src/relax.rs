//! Relaxation strategies and suggestion generation.
//!
//! The strategy table maps a constraint's field to one of five strategy
//! shapes; applying a strategy to a diagnosed constraint yields concrete,
//! rankable suggestions. Every suggestion is traceable to exactly one
//! strategy application, and no suggestion references a strategy field
//! that its own variant does not carry.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use matchcore_core::{CompareOp, FieldValue, MatchCoreError, Result, TestableConstraint};

/// Rationale templates for the three skill relaxation moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRationales {
    pub lower_proficiency: String,
    pub move_to_preferred: String,
    pub remove_skill: String,
}

/// How to loosen one kind of constraint.
///
/// Loaded once per process as part of the strategy table and never
/// mutated. Template placeholders: `{field}`, `{original}`, `{suggested}`,
/// `{expanded}`, `{skill}`, `{rule}` as applicable per variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelaxationStrategy {
    /// Scale a numeric bound by configured multipliers.
    NumericStep {
        #[serde(default)]
        steps_down: Vec<Decimal>,
        #[serde(default)]
        steps_up: Vec<Decimal>,
        rationale_template: String,
        suggested_field: String,
    },
    /// Widen an enum constraint along a configured ladder.
    EnumExpand {
        ordered_values: Vec<String>,
        max_expansion: usize,
        rationale_template: String,
        suggested_field: String,
    },
    /// Drop the constraint outright.
    Remove {
        rationale_template: String,
        suggested_field: String,
    },
    /// Disable the inference rule that derived the constraint.
    DerivedOverride { rationale_template: String },
    /// Loosen a skill requirement: lower proficiency, prefer, or remove.
    SkillRelaxation {
        /// Strictest first.
        proficiency_order: Vec<String>,
        rationales: SkillRationales,
    },
}

/// One concrete relaxation proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxationSuggestion {
    /// Field the user should change.
    pub suggested_field: String,
    /// Proposed new value; `None` proposes removal.
    pub suggested_value: Option<FieldValue>,
    /// Human-readable justification from the strategy's template.
    pub rationale: String,
}

/// Field-keyed strategy table plus the dispatch logic.
#[derive(Debug, Clone, Default)]
pub struct RelaxationAdvisor {
    table: BTreeMap<String, RelaxationStrategy>,
}

impl RelaxationAdvisor {
    pub fn new(table: BTreeMap<String, RelaxationStrategy>) -> Self {
        Self { table }
    }

    /// The configured strategy for a field, if any.
    pub fn strategy_for(&self, field: &str) -> Option<&RelaxationStrategy> {
        self.table.get(field)
    }

    /// Suggestions for a constraint using the table, falling back to
    /// outright removal for fields with no configured strategy.
    pub fn suggest(&self, constraint: &TestableConstraint) -> Result<Vec<RelaxationSuggestion>> {
        match self.table.get(&constraint.field) {
            Some(strategy) => suggest_with(constraint, strategy),
            None => {
                let fallback = RelaxationStrategy::Remove {
                    rationale_template: "Consider removing the {field} requirement".into(),
                    suggested_field: constraint.field.clone(),
                };
                suggest_with(constraint, &fallback)
            }
        }
    }
}

/// Applies one strategy to one constraint.
///
/// # Errors
///
/// Returns `MatchCoreError::Config` when the strategy shape cannot apply
/// to the constraint it was configured for (a numeric strategy on a
/// non-numeric value, a derived override on an explicit constraint).
pub fn suggest_with(
    constraint: &TestableConstraint,
    strategy: &RelaxationStrategy,
) -> Result<Vec<RelaxationSuggestion>> {
    match strategy {
        RelaxationStrategy::NumericStep {
            steps_down,
            steps_up,
            rationale_template,
            suggested_field,
        } => numeric_step(
            constraint,
            steps_down,
            steps_up,
            rationale_template,
            suggested_field,
        ),
        RelaxationStrategy::EnumExpand {
            ordered_values,
            max_expansion,
            rationale_template,
            suggested_field,
        } => Ok(enum_expand(
            constraint,
            ordered_values,
            *max_expansion,
            rationale_template,
            suggested_field,
        )),
        RelaxationStrategy::Remove {
            rationale_template,
            suggested_field,
        } => Ok(vec![RelaxationSuggestion {
            suggested_field: suggested_field.clone(),
            suggested_value: None,
            rationale: fill(
                rationale_template,
                &[
                    ("field", constraint.field.clone()),
                    ("original", constraint.value.to_string()),
                ],
            ),
        }]),
        RelaxationStrategy::DerivedOverride { rationale_template } => {
            let Some(rule) = constraint.origin_rule.as_deref() else {
                return Err(MatchCoreError::Config(format!(
                    "derived-override strategy on constraint '{}' with no originating rule",
                    constraint.id
                )));
            };
            Ok(vec![RelaxationSuggestion {
                suggested_field: format!("override_rule:{rule}"),
                suggested_value: Some(FieldValue::text(rule)),
                rationale: fill(
                    rationale_template,
                    &[
                        ("field", constraint.field.clone()),
                        ("rule", rule.to_string()),
                    ],
                ),
            }])
        }
        RelaxationStrategy::SkillRelaxation {
            proficiency_order,
            rationales,
        } => Ok(skill_relaxation(constraint, proficiency_order, rationales)),
    }
}

fn numeric_step(
    constraint: &TestableConstraint,
    steps_down: &[Decimal],
    steps_up: &[Decimal],
    rationale_template: &str,
    suggested_field: &str,
) -> Result<Vec<RelaxationSuggestion>> {
    let Some(original) = constraint.value.as_number() else {
        return Err(MatchCoreError::Config(format!(
            "numeric-step strategy on non-numeric constraint '{}'",
            constraint.id
        )));
    };

    // Ceilings relax upward, floors downward; an equality constraint
    // relaxes in both configured directions.
    let multipliers: Vec<Decimal> = match constraint.op {
        CompareOp::Lte => steps_up.to_vec(),
        CompareOp::Gte => steps_down.to_vec(),
        _ => steps_down.iter().chain(steps_up).copied().collect(),
    };

    Ok(multipliers
        .into_iter()
        .map(|m| {
            let suggested = (original * m).normalize();
            RelaxationSuggestion {
                suggested_field: suggested_field.to_string(),
                suggested_value: Some(FieldValue::Number(suggested)),
                rationale: fill(
                    rationale_template,
                    &[
                        ("field", constraint.field.clone()),
                        ("original", original.normalize().to_string()),
                        ("suggested", suggested.to_string()),
                    ],
                ),
            }
        })
        .collect())
}

fn enum_expand(
    constraint: &TestableConstraint,
    ordered_values: &[String],
    max_expansion: usize,
    rationale_template: &str,
    suggested_field: &str,
) -> Vec<RelaxationSuggestion> {
    // A single value widens into a list; an existing list (an `in` set)
    // grows from its furthest ladder member.
    let base: Vec<String> = match &constraint.value {
        FieldValue::Text(s) => vec![s.clone()],
        FieldValue::List(items) if !items.is_empty() => items.clone(),
        _ => {
            warn!(
                event = "enum_expand_skipped",
                constraint = %constraint.id,
                reason = "value is neither text nor a non-empty list",
            );
            return Vec::new();
        }
    };
    let Some(pos) = base
        .iter()
        .filter_map(|v| ordered_values.iter().position(|lv| lv == v))
        .max()
    else {
        warn!(
            event = "enum_expand_skipped",
            constraint = %constraint.id,
            reason = "value not on the configured ladder",
        );
        return Vec::new();
    };

    let mut suggestions = Vec::new();
    for step in 1..=max_expansion {
        let Some(end) = pos.checked_add(step).filter(|&e| e < ordered_values.len()) else {
            break;
        };
        let mut expanded = base.clone();
        expanded.extend(
            ordered_values[pos + 1..=end]
                .iter()
                .filter(|v| !base.contains(*v))
                .cloned(),
        );
        suggestions.push(RelaxationSuggestion {
            suggested_field: suggested_field.to_string(),
            suggested_value: Some(FieldValue::List(expanded.clone())),
            rationale: fill(
                rationale_template,
                &[
                    ("field", constraint.field.clone()),
                    ("original", constraint.value.to_string()),
                    ("expanded", expanded.join(", ")),
                ],
            ),
        });
    }
    suggestions
}

fn skill_relaxation(
    constraint: &TestableConstraint,
    proficiency_order: &[String],
    rationales: &SkillRationales,
) -> Vec<RelaxationSuggestion> {
    // Skill constraints carry either a bare skill name or
    // [skill, min_proficiency].
    let (skill, current_level) = match &constraint.value {
        FieldValue::Text(skill) => (skill.as_str(), None),
        FieldValue::List(items) if !items.is_empty() => {
            (items[0].as_str(), items.get(1).map(String::as_str))
        }
        _ => return Vec::new(),
    };

    let mut suggestions = Vec::new();

    // Move 1: lower the proficiency floor one step, when there is one.
    if let Some(level) = current_level {
        let next = proficiency_order
            .iter()
            .position(|p| p == level)
            .and_then(|pos| proficiency_order.get(pos + 1));
        if let Some(next) = next {
            suggestions.push(RelaxationSuggestion {
                suggested_field: constraint.field.clone(),
                suggested_value: Some(FieldValue::List(vec![skill.to_string(), next.clone()])),
                rationale: fill(
                    &rationales.lower_proficiency,
                    &[
                        ("skill", skill.to_string()),
                        ("original", level.to_string()),
                        ("suggested", next.clone()),
                    ],
                ),
            });
        }
    }

    // Move 2: keep the skill but make it preferred instead of required.
    suggestions.push(RelaxationSuggestion {
        suggested_field: "preferred_skills".into(),
        suggested_value: Some(FieldValue::text(skill)),
        rationale: fill(&rationales.move_to_preferred, &[("skill", skill.to_string())]),
    });

    // Move 3: drop the requirement.
    suggestions.push(RelaxationSuggestion {
        suggested_field: constraint.field.clone(),
        suggested_value: None,
        rationale: fill(&rationales.remove_skill, &[("skill", skill.to_string())]),
    });

    suggestions
}

fn fill(template: &str, substitutions: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in substitutions {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}
