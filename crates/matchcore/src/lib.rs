//! MatchCore - the reasoning core of a constraint-based candidate matcher.
//!
//! Given a manager's hiring requirements, MatchCore expands them into a
//! fuller requirement set by rule inference, decomposes the result into
//! independently testable constraints, and - when the combined constraints
//! match too few candidates - explains why by finding minimal conflict
//! sets and turning each into concrete relaxation suggestions.
//!
//! The crate is I/O-free: persistence, ranking and HTTP belong to the
//! surrounding service. The only external boundary is the async
//! [`CountOracle`] that executes count queries.
//!
//! # Example
//!
//! ```no_run
//! use matchcore::{MatchConfig, ResolvedRequest, ShortfallPipeline};
//! # use std::collections::BTreeSet;
//! # struct MyOracle;
//! # impl matchcore::CountOracle for MyOracle {
//! #     async fn count(&self, _: &BTreeSet<String>) -> Result<u64, matchcore::OracleError> {
//! #         Ok(0)
//! #     }
//! # }
//!
//! # async fn demo() -> matchcore::Result<()> {
//! let config = MatchConfig::load("matchcore.toml").unwrap_or_default();
//! let pipeline = ShortfallPipeline::new(config, MyOracle)?;
//! let outcome = pipeline.run(&ResolvedRequest::default()).await?;
//! for suggestion in &outcome.suggestions {
//!     println!("{}", suggestion.rationale);
//! }
//! # Ok(())
//! # }
//! ```

mod pipeline;

pub use pipeline::{PipelineOutcome, ShortfallPipeline};

// Core value types
pub use matchcore_core::{
    CompareOp, FactContext, FactPath, FieldValue, MatchCoreError, ProvenanceChain,
    ResolvedRequest, Result, SkillRequirement, TestableConstraint,
};

// Rule engine
pub use matchcore_rules::{
    ConditionOp, ConditionTree, EffectKind, RuleDefinition, RuleEffect, RuleEngine,
    DEFAULT_MAX_ITERATIONS,
};

// Decomposition and diagnosis
pub use matchcore_diagnosis::{
    decompose, CountOracle, CountQuery, DecomposedConstraintSet, DiagnosisConfig,
    DiagnosisResult, Diagnoser, OracleError, RelaxationAdvisor, RelaxationStrategy,
    RelaxationSuggestion, SkillRationales,
};

// Configuration
pub use matchcore_config::{ConfigError, MatchConfig};
