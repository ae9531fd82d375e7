//! MatchCore Rules - Forward-chaining requirement expansion
//!
//! Expands a user's explicit hiring requirements into a fuller requirement
//! set by repeatedly applying condition -> effect rules until nothing new
//! can be derived (or an iteration cap is hit). Every derived fact carries
//! provenance: the ordered rule-id chains that caused it.
//!
//! Rule conditions are interpreted by an owned [`ConditionTree`] evaluator;
//! there is no external rules-engine dependency, so evaluation semantics
//! are fully specified and testable in isolation.

pub mod condition;
pub mod engine;
pub mod rule;

#[cfg(test)]
mod engine_tests;

pub use condition::{ConditionOp, ConditionTree};
pub use engine::{RuleEngine, DEFAULT_MAX_ITERATIONS};
pub use rule::{EffectKind, RuleDefinition, RuleEffect};
