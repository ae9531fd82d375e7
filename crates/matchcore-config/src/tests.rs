//! Tests for MatchCore configuration.

use matchcore_core::FieldValue;
use matchcore_diagnosis::RelaxationStrategy;
use matchcore_rules::{ConditionOp, ConditionTree, EffectKind, RuleDefinition, RuleEffect};

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        max_inference_iterations = 5

        [diagnosis]
        max_sets = 2
        insufficient_threshold = 5

        [[rules]]
        id = "staff-needs-mentoring"
        name = "Staff engineers must mentor"
        priority = 10

        [rules.condition]
        type = "leaf"
        path = "required.seniority"
        op = "eq"
        value = "staff"

        [rules.effect]
        kind = "derived_filter"
        target_field = "skills"
        target_value = "mentoring"
        rationale = "Staff roles carry mentoring responsibility"

        [strategies.budget]
        type = "numeric_step"
        steps_up = [1.2, 1.5]
        rationale_template = "Raise {field} from {original} to {suggested}"
        suggested_field = "budget"

        [strategies.skills]
        type = "skill_relaxation"
        proficiency_order = ["expert", "proficient", "learning"]

        [strategies.skills.rationales]
        lower_proficiency = "Accept {skill} at {suggested}"
        move_to_preferred = "Prefer {skill} instead of requiring it"
        remove_skill = "Drop the {skill} requirement"
    "#;

    let config = MatchConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.max_inference_iterations, 5);
    assert_eq!(config.diagnosis.max_sets, 2);
    assert_eq!(config.diagnosis.insufficient_threshold, 5);
    assert_eq!(config.rules.len(), 1);
    assert_eq!(config.rules[0].priority, 10);
    assert!(matches!(
        config.strategies.get("budget"),
        Some(RelaxationStrategy::NumericStep { steps_up, .. }) if steps_up.len() == 2
    ));
    assert!(matches!(
        config.strategies.get("skills"),
        Some(RelaxationStrategy::SkillRelaxation { .. })
    ));
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        diagnosis:
          max_sets: 4
          insufficient_threshold: 2
        rules:
          - id: fintech-needs-compliance
            name: Fintech roles need compliance awareness
            condition:
              type: leaf
              path: domains
              op: contains
              value: fintech
            effect:
              kind: derived_boost
              target_field: compliance_experience
              target_value: "yes"
              rationale: Fintech hires benefit from compliance exposure
        strategies:
          seniority:
            type: enum_expand
            ordered_values: [staff, senior, mid]
            max_expansion: 2
            rationale_template: "Widen {field} to {expanded}"
            suggested_field: seniority
    "#;

    let config = MatchConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.diagnosis.max_sets, 4);
    assert_eq!(config.rules.len(), 1);
    assert_eq!(config.rules[0].priority, 0);
    assert!(config.strategies.contains_key("seniority"));
}

#[test]
fn test_defaults_apply_when_sections_missing() {
    let config = MatchConfig::from_toml_str("").unwrap();
    assert_eq!(config.diagnosis.max_sets, 3);
    assert_eq!(config.diagnosis.insufficient_threshold, 3);
    assert_eq!(config.max_inference_iterations, 10);
    assert!(config.rules.is_empty());
    assert!(config.strategies.is_empty());
}

#[test]
fn test_builder() {
    let rule = RuleDefinition {
        id: "r1".into(),
        name: "r1".into(),
        priority: 1,
        condition: ConditionTree::leaf("required.seniority", ConditionOp::Eq, FieldValue::text("staff")),
        effect: RuleEffect {
            kind: EffectKind::DerivedFilter,
            target_field: "skills".into(),
            target_value: FieldValue::text("mentoring"),
            rationale: "why".into(),
            boost_strength: None,
        },
    };
    let config = MatchConfig::new()
        .with_rule(rule)
        .with_strategy(
            "budget",
            RelaxationStrategy::Remove {
                rationale_template: "Drop {field}".into(),
                suggested_field: "budget".into(),
            },
        );
    assert!(config.validate().is_ok());
    assert_eq!(config.rules.len(), 1);
}

#[test]
fn test_duplicate_rule_ids_rejected() {
    let rule = RuleDefinition {
        id: "dup".into(),
        name: "dup".into(),
        priority: 0,
        condition: ConditionTree::leaf("required.seniority", ConditionOp::Eq, FieldValue::text("staff")),
        effect: RuleEffect {
            kind: EffectKind::DerivedFilter,
            target_field: "skills".into(),
            target_value: FieldValue::text("x"),
            rationale: "why".into(),
            boost_strength: None,
        },
    };
    let config = MatchConfig::new().with_rule(rule.clone()).with_rule(rule);
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_malformed_condition_path_rejected_at_load() {
    let toml = r#"
        [[rules]]
        id = "bad"
        name = "bad path"

        [rules.condition]
        type = "leaf"
        path = "required.a.b.c"
        op = "eq"
        value = "x"

        [rules.effect]
        kind = "derived_filter"
        target_field = "skills"
        target_value = "x"
        rationale = "why"
    "#;
    assert!(matches!(
        MatchConfig::from_toml_str(toml),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_degenerate_strategies_rejected() {
    let empty_numeric = MatchConfig::new().with_strategy(
        "budget",
        RelaxationStrategy::NumericStep {
            steps_down: vec![],
            steps_up: vec![],
            rationale_template: "t".into(),
            suggested_field: "budget".into(),
        },
    );
    assert!(empty_numeric.validate().is_err());

    let empty_ladder = MatchConfig::new().with_strategy(
        "seniority",
        RelaxationStrategy::EnumExpand {
            ordered_values: vec![],
            max_expansion: 1,
            rationale_template: "t".into(),
            suggested_field: "seniority".into(),
        },
    );
    assert!(empty_ladder.validate().is_err());
}

#[test]
fn test_unknown_strategy_kind_is_a_parse_error() {
    let toml = r#"
        [strategies.budget]
        type = "teleport"
        rationale_template = "t"
    "#;
    assert!(matches!(
        MatchConfig::from_toml_str(toml),
        Err(ConfigError::Toml(_))
    ));
}
