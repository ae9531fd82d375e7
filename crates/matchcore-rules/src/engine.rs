//! Forward-chaining inference engine.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use matchcore_core::{FactContext, ProvenanceChain, ResolvedRequest, Result};

use crate::rule::{EffectKind, RuleDefinition};

/// Default pass cap. Hitting it is not an error: it guards against cyclic
/// rule dependencies (A -> B -> A) and yields whatever was derived so far.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Forward-chaining evaluator over an immutable rule set.
///
/// Rules are sorted once at construction by descending priority, then
/// declaration order (stable sort). Each `infer` call owns its own
/// [`FactContext`]; the engine itself is immutable and shareable across
/// requests.
pub struct RuleEngine {
    rules: Vec<RuleDefinition>,
}

impl RuleEngine {
    /// Creates an engine, validating every rule's condition paths.
    ///
    /// # Errors
    ///
    /// Returns `MatchCoreError::Config` for the first malformed rule;
    /// configuration errors are fatal at load time.
    pub fn new(mut rules: Vec<RuleDefinition>) -> Result<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        rules.sort_by_key(|r| std::cmp::Reverse(r.priority));
        Ok(Self { rules })
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }

    /// Looks up a rule by id.
    pub fn rule(&self, id: &str) -> Option<&RuleDefinition> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Expands a resolved request into a full fact context.
    ///
    /// Repeats passes over all rules in evaluation order. A rule fires in
    /// a pass when its condition holds against the current context, its id
    /// is not in `overridden` and it has not fired earlier in this run.
    /// Stops at fixpoint or after `max_iterations` passes, whichever
    /// comes first.
    ///
    /// When two rules write the same scalar property in the same pass, the
    /// later-evaluated rule wins (priority desc, then declaration order);
    /// both firings keep their provenance chains.
    pub fn infer(
        &self,
        request: &ResolvedRequest,
        overridden: &BTreeSet<String>,
        max_iterations: usize,
    ) -> FactContext {
        let mut ctx = FactContext::new(request.clone());
        let mut fired: BTreeSet<&str> = BTreeSet::new();

        for pass in 1..=max_iterations {
            let mut fired_this_pass = 0usize;

            for rule in &self.rules {
                if fired.contains(rule.id.as_str()) || overridden.contains(&rule.id) {
                    continue;
                }
                if !rule.condition.evaluate(&ctx) {
                    continue;
                }

                let chains = self.derivation_chains(rule, &ctx);
                self.apply_effect(rule, chains, &mut ctx);
                fired.insert(rule.id.as_str());
                fired_this_pass += 1;
                debug!(event = "rule_fired", rule = %rule.id, pass = pass);
            }

            if fired_this_pass == 0 {
                info!(
                    event = "inference_fixpoint",
                    passes = pass,
                    rules_fired = fired.len(),
                );
                return ctx;
            }
        }

        // Degraded but valid: likely a rule cycle kept producing firings.
        warn!(
            event = "inference_cap_reached",
            max_iterations = max_iterations,
            rules_fired = fired.len(),
        );
        ctx
    }

    /// Expands with the default iteration cap.
    pub fn infer_default(&self, request: &ResolvedRequest) -> FactContext {
        self.infer(request, &request.overridden_rules, DEFAULT_MAX_ITERATIONS)
    }

    /// Provenance chains for a firing rule: each chain of each derived
    /// fact the condition read, extended by this rule's id. A rule whose
    /// condition only reads explicit facts roots a fresh chain.
    fn derivation_chains(&self, rule: &RuleDefinition, ctx: &FactContext) -> Vec<ProvenanceChain> {
        let mut support = Vec::new();
        rule.condition.support_keys(ctx, &mut support);

        let mut chains: Vec<ProvenanceChain> = Vec::new();
        for key in &support {
            for chain in ctx.provenance_of(key) {
                let mut extended = chain.clone();
                extended.push(rule.id.clone());
                if !chains.contains(&extended) {
                    chains.push(extended);
                }
            }
        }
        if chains.is_empty() {
            chains.push(vec![rule.id.clone()]);
        }
        chains
    }

    fn apply_effect(&self, rule: &RuleDefinition, chains: Vec<ProvenanceChain>, ctx: &mut FactContext) {
        let effect = &rule.effect;
        match effect.kind {
            EffectKind::DerivedFilter => {
                if effect.is_skill_target() {
                    if let Some(skill) = effect.target_value.as_text() {
                        ctx.add_skill(skill, None, chains);
                    }
                } else {
                    ctx.set_required(&effect.target_field, effect.target_value.clone(), chains);
                }
            }
            EffectKind::DerivedBoost => {
                // Preferred skills live in the preferred map under a
                // per-skill key so independent boosts never collide.
                if effect.is_skill_target() {
                    if let Some(skill) = effect.target_value.as_text() {
                        let field = format!("skill.{skill}");
                        ctx.set_preferred(&field, effect.target_value.clone(), chains);
                    }
                } else {
                    ctx.set_preferred(&effect.target_field, effect.target_value.clone(), chains);
                }
            }
        }
    }
}
