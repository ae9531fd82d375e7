//! Tests for the forward-chaining engine.

use std::collections::BTreeSet;

use matchcore_core::{FieldValue, ResolvedRequest};

use super::condition::{ConditionOp, ConditionTree};
use super::engine::{RuleEngine, DEFAULT_MAX_ITERATIONS};
use super::rule::{EffectKind, RuleDefinition, RuleEffect};

fn filter_rule(id: &str, priority: i32, condition: ConditionTree, field: &str, value: FieldValue) -> RuleDefinition {
    RuleDefinition {
        id: id.into(),
        name: id.into(),
        priority,
        condition,
        effect: RuleEffect {
            kind: EffectKind::DerivedFilter,
            target_field: field.into(),
            target_value: value,
            rationale: format!("derived by {id}"),
            boost_strength: None,
        },
    }
}

fn skill_rule(id: &str, priority: i32, condition: ConditionTree, skill: &str) -> RuleDefinition {
    filter_rule(id, priority, condition, "skills", FieldValue::text(skill))
}

fn staff_request() -> ResolvedRequest {
    let mut request = ResolvedRequest::default();
    request
        .required
        .insert("seniority".into(), FieldValue::text("staff"));
    request
}

fn no_overrides() -> BTreeSet<String> {
    BTreeSet::new()
}

#[test]
fn acyclic_chain_reaches_fixpoint_before_cap() {
    // staff -> mentoring -> leadership, all derivable in-order.
    let rules = vec![
        skill_rule(
            "r-mentoring",
            10,
            ConditionTree::leaf("required.seniority", ConditionOp::Eq, FieldValue::text("staff")),
            "mentoring",
        ),
        skill_rule(
            "r-leadership",
            5,
            ConditionTree::leaf("skills", ConditionOp::Contains, FieldValue::text("mentoring")),
            "leadership",
        ),
    ];
    let engine = RuleEngine::new(rules).unwrap();
    let ctx = engine.infer(&staff_request(), &no_overrides(), DEFAULT_MAX_ITERATIONS);

    assert!(ctx.skills().contains_key("mentoring"));
    assert!(ctx.skills().contains_key("leadership"));
}

#[test]
fn iteration_cap_returns_partial_derivation_without_error() {
    // r-second is evaluated before r-first (higher priority) but depends
    // on r-first's output, so it needs a second pass. A cap of one pass
    // yields a degraded-but-valid result.
    let rules = vec![
        skill_rule(
            "r-second",
            10,
            ConditionTree::leaf("skills", ConditionOp::Contains, FieldValue::text("mentoring")),
            "leadership",
        ),
        skill_rule(
            "r-first",
            1,
            ConditionTree::leaf("required.seniority", ConditionOp::Eq, FieldValue::text("staff")),
            "mentoring",
        ),
    ];
    let engine = RuleEngine::new(rules).unwrap();
    let ctx = engine.infer(&staff_request(), &no_overrides(), 1);

    assert!(ctx.skills().contains_key("mentoring"));
    assert!(!ctx.skills().contains_key("leadership"));
}

#[test]
fn mutually_dependent_rules_terminate() {
    // A 2-cycle: each rule's condition is satisfied by the other's effect.
    // Fire-once semantics mean both rules fire exactly once and the run
    // reaches fixpoint on the next pass, well inside the default cap; a
    // one-pass cap yields the same derived facts.
    let cycle = || {
        vec![
            skill_rule(
                "r-a",
                0,
                ConditionTree::Any {
                    any: vec![
                        ConditionTree::leaf("skills", ConditionOp::Contains, FieldValue::text("b")),
                        ConditionTree::leaf("required.seniority", ConditionOp::Eq, FieldValue::text("staff")),
                    ],
                },
                "b",
            ),
            skill_rule(
                "r-b",
                0,
                ConditionTree::leaf("skills", ConditionOp::Contains, FieldValue::text("b")),
                "b",
            ),
        ]
    };

    let engine = RuleEngine::new(cycle()).unwrap();
    let ctx = engine.infer(&staff_request(), &no_overrides(), DEFAULT_MAX_ITERATIONS);
    assert!(ctx.skills().contains_key("b"));

    let capped = RuleEngine::new(cycle()).unwrap();
    let ctx = capped.infer(&staff_request(), &no_overrides(), 1);
    assert!(ctx.skills().contains_key("b"));
}

#[test]
fn overridden_rule_never_fires() {
    let rules = vec![skill_rule(
        "r-mentoring",
        0,
        ConditionTree::leaf("required.seniority", ConditionOp::Eq, FieldValue::text("staff")),
        "mentoring",
    )];
    let engine = RuleEngine::new(rules).unwrap();
    let overridden: BTreeSet<String> = ["r-mentoring".to_string()].into();
    let ctx = engine.infer(&staff_request(), &overridden, DEFAULT_MAX_ITERATIONS);

    assert!(!ctx.skills().contains_key("mentoring"));
    assert!(ctx.provenance_of("skills.mentoring").is_empty());
}

#[test]
fn same_pass_scalar_conflict_last_evaluated_wins() {
    let cond = ConditionTree::leaf("required.seniority", ConditionOp::Eq, FieldValue::text("staff"));
    let rules = vec![
        filter_rule("r-high", 10, cond.clone(), "timeline_days", FieldValue::number(30)),
        filter_rule("r-low", 1, cond, "timeline_days", FieldValue::number(60)),
    ];
    let engine = RuleEngine::new(rules).unwrap();
    let ctx = engine.infer(&staff_request(), &no_overrides(), DEFAULT_MAX_ITERATIONS);

    // r-low is evaluated after r-high (lower priority) and overwrites the
    // scalar; provenance keeps both derivations.
    assert_eq!(
        ctx.required().get("timeline_days"),
        Some(&FieldValue::number(60))
    );
    let chains = ctx.provenance_of("required.timeline_days");
    assert_eq!(chains.len(), 2);
}

#[test]
fn provenance_chains_follow_derivation_order() {
    let rules = vec![
        skill_rule(
            "r-root",
            10,
            ConditionTree::leaf("required.seniority", ConditionOp::Eq, FieldValue::text("staff")),
            "mentoring",
        ),
        skill_rule(
            "r-next",
            5,
            ConditionTree::leaf("skills", ConditionOp::Contains, FieldValue::text("mentoring")),
            "leadership",
        ),
    ];
    let engine = RuleEngine::new(rules).unwrap();
    let ctx = engine.infer(&staff_request(), &no_overrides(), DEFAULT_MAX_ITERATIONS);

    assert_eq!(
        ctx.provenance_of("skills.mentoring"),
        &[vec!["r-root".to_string()]]
    );
    assert_eq!(
        ctx.provenance_of("skills.leadership"),
        &[vec!["r-root".to_string(), "r-next".to_string()]]
    );
}

#[test]
fn boost_rule_writes_preferred_dimension() {
    let mut rule = filter_rule(
        "r-boost",
        0,
        ConditionTree::leaf("required.seniority", ConditionOp::Eq, FieldValue::text("staff")),
        "timezone_overlap",
        FieldValue::text("high"),
    );
    rule.effect.kind = EffectKind::DerivedBoost;
    let engine = RuleEngine::new(vec![rule]).unwrap();
    let ctx = engine.infer(&staff_request(), &no_overrides(), DEFAULT_MAX_ITERATIONS);

    assert_eq!(
        ctx.preferred().get("timezone_overlap"),
        Some(&FieldValue::text("high"))
    );
    assert!(ctx.required().get("timezone_overlap").is_none());
}

#[test]
fn malformed_condition_path_is_fatal_at_load() {
    let rule = skill_rule(
        "r-bad",
        0,
        ConditionTree::leaf("not a path", ConditionOp::Eq, FieldValue::text("x")),
        "anything",
    );
    assert!(RuleEngine::new(vec![rule]).is_err());
}
