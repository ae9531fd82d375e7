//! Constraint decomposition and count-query construction.
//!
//! Decomposition turns a fully resolved fact context into an ordered list
//! of atomic constraints, each independently removable. The query builder
//! renders the same underlying candidate search used for normal matching,
//! filtered to an arbitrary subset of constraint ids; omitted constraints
//! are simply unconstrained. Determinism matters more than speed here: the
//! diagnoser calls `build_query` many times with overlapping subsets and
//! relies on identical subsets producing identical queries.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use matchcore_core::{
    CompareOp, FactContext, FieldValue, MatchCoreError, Result, TestableConstraint,
};

/// A rendered count query with named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CountQuery {
    pub text: String,
    pub params: Vec<(String, FieldValue)>,
}

/// The full ordered constraint list for one request.
#[derive(Debug, Clone)]
pub struct DecomposedConstraintSet {
    constraints: Vec<TestableConstraint>,
    by_id: BTreeMap<String, usize>,
}

impl DecomposedConstraintSet {
    /// Builds a set from pre-made constraints, keeping their order.
    /// Mostly useful for tests and custom decompositions.
    pub fn from_constraints(constraints: Vec<TestableConstraint>) -> Self {
        let by_id = constraints
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self { constraints, by_id }
    }

    /// All constraints in decomposition order.
    pub fn constraints(&self) -> &[TestableConstraint] {
        &self.constraints
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// True when the request decomposed to nothing.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// The full id set.
    pub fn ids(&self) -> BTreeSet<String> {
        self.constraints.iter().map(|c| c.id.clone()).collect()
    }

    /// Looks up a constraint by id.
    pub fn get(&self, id: &str) -> Option<&TestableConstraint> {
        self.by_id.get(id).map(|&i| &self.constraints[i])
    }

    /// Renders the count query for a subset of constraint ids.
    ///
    /// Pure: the same subset always renders the same query text and
    /// parameters. Ids not in this set are ignored; an empty subset counts
    /// all candidates.
    ///
    /// # Errors
    ///
    /// Returns `MatchCoreError::Config` when a constraint's operator
    /// cannot be rendered against its value shape. A silently skipped
    /// constraint would corrupt any diagnosis built on the count, so this
    /// is fatal.
    pub fn build_query(&self, subset: &BTreeSet<String>) -> Result<CountQuery> {
        let mut text = String::from("SELECT COUNT(*) FROM candidates c");
        let mut params = Vec::new();
        let mut first = true;

        for constraint in &self.constraints {
            if !subset.contains(&constraint.id) {
                continue;
            }
            let clause = render_clause(constraint, params.len())?;
            text.push_str(if first { " WHERE " } else { " AND " });
            text.push_str(&clause.text);
            params.extend(clause.params);
            first = false;
        }

        Ok(CountQuery { text, params })
    }
}

struct Clause {
    text: String,
    params: Vec<(String, FieldValue)>,
}

fn render_clause(constraint: &TestableConstraint, param_offset: usize) -> Result<Clause> {
    let field = &constraint.field;
    let name = format!("p{param_offset}");
    let mut params = Vec::new();
    let mut text = String::new();

    match (constraint.op, &constraint.value) {
        (CompareOp::Eq, value) => {
            write!(text, "c.{field} = :{name}").ok();
            params.push((name, value.clone()));
        }
        (CompareOp::Lte, FieldValue::Number(_)) => {
            write!(text, "c.{field} <= :{name}").ok();
            params.push((name, constraint.value.clone()));
        }
        (CompareOp::Gte, FieldValue::Number(_)) => {
            write!(text, "c.{field} >= :{name}").ok();
            params.push((name, constraint.value.clone()));
        }
        (CompareOp::In, FieldValue::List(_)) => {
            write!(text, "c.{field} IN (:{name})").ok();
            params.push((name, constraint.value.clone()));
        }
        (CompareOp::Has, FieldValue::Text(_)) => {
            write!(
                text,
                "EXISTS (SELECT 1 FROM candidate_{field} x WHERE x.candidate_id = c.id AND x.value = :{name})"
            )
            .ok();
            params.push((name, constraint.value.clone()));
        }
        (CompareOp::Has, FieldValue::List(items)) if !items.is_empty() => {
            // Skill constraints carry [skill, min_proficiency].
            let skill = items[0].clone();
            write!(
                text,
                "EXISTS (SELECT 1 FROM candidate_{field} x WHERE x.candidate_id = c.id AND x.value = :{name}"
            )
            .ok();
            params.push((name.clone(), FieldValue::Text(skill)));
            if let Some(level) = items.get(1) {
                let level_name = format!("p{}", param_offset + 1);
                write!(text, " AND x.proficiency >= :{level_name}").ok();
                params.push((level_name, FieldValue::Text(level.clone())));
            }
            text.push(')');
        }
        (op, value) => {
            return Err(MatchCoreError::Config(format!(
                "constraint '{}': operator {op} cannot be rendered for value {value:?}",
                constraint.id
            )));
        }
    }

    Ok(Clause { text, params })
}

/// Numeric fields that are ceilings (relax upward) in a hiring request.
const CEILING_FIELDS: &[&str] = &["budget", "rate", "timeline_days"];
/// Numeric fields that are floors (relax downward).
const FLOOR_FIELDS: &[&str] = &["experience_years"];

fn operator_for(field: &str, value: &FieldValue) -> CompareOp {
    match value {
        FieldValue::List(_) => CompareOp::In,
        FieldValue::Number(_) if CEILING_FIELDS.contains(&field) => CompareOp::Lte,
        FieldValue::Number(_) if FLOOR_FIELDS.contains(&field) => CompareOp::Gte,
        _ => CompareOp::Eq,
    }
}

fn origin_rule_for(ctx: &FactContext, key: &str) -> Option<String> {
    // Last rule of the first chain is the rule that produced the value.
    ctx.provenance_of(key)
        .first()
        .and_then(|chain| chain.last().cloned())
}

/// Decomposes a resolved fact context into testable constraints.
///
/// Each semantically distinct requirement becomes exactly one constraint:
/// every required property, then every required skill, then every domain,
/// in stable (map/declaration) order. Ids are unique within the set:
/// `req:<field>`, `skill:<id>`, `domain:<id>`.
pub fn decompose(ctx: &FactContext) -> DecomposedConstraintSet {
    let mut constraints = Vec::new();

    for (field, value) in ctx.required() {
        let op = operator_for(field, value);
        let description = match op {
            CompareOp::Lte => format!("Maximum {field} of {value}"),
            CompareOp::Gte => format!("Minimum {field} of {value}"),
            CompareOp::In => format!("{field} must be one of: {value}"),
            _ => format!("{field} must be {value}"),
        };
        let mut constraint = TestableConstraint::new(
            format!("req:{field}"),
            field.clone(),
            op,
            value.clone(),
            description,
        );
        if let Some(rule) = origin_rule_for(ctx, &format!("required.{field}")) {
            constraint = constraint.with_origin_rule(rule);
        }
        constraints.push(constraint);
    }

    for (skill, proficiency) in ctx.skills() {
        let (value, description) = match proficiency {
            Some(level) => (
                FieldValue::List(vec![skill.clone(), level.clone()]),
                format!("Requires {skill} at {level} or above"),
            ),
            None => (FieldValue::Text(skill.clone()), format!("Requires {skill}")),
        };
        let mut constraint = TestableConstraint::new(
            format!("skill:{skill}"),
            "skills",
            CompareOp::Has,
            value,
            description,
        );
        if let Some(rule) = origin_rule_for(ctx, &format!("skills.{skill}")) {
            constraint = constraint.with_origin_rule(rule);
        }
        constraints.push(constraint);
    }

    for domain in &ctx.request().domains {
        constraints.push(TestableConstraint::new(
            format!("domain:{domain}"),
            "domains",
            CompareOp::Has,
            FieldValue::Text(domain.clone()),
            format!("Requires {domain} domain experience"),
        ));
    }

    DecomposedConstraintSet::from_constraints(constraints)
}
