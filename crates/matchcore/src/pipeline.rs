//! End-to-end shortfall pipeline.
//!
//! Wires the subsystems together along the request data flow: infer,
//! decompose, count, and - on a shortfall - diagnose and advise. Each
//! `run` call owns all of its intermediate state; the pipeline itself is
//! immutable and shareable across requests.

use tracing::info;

use matchcore_config::MatchConfig;
use matchcore_core::{FactContext, ResolvedRequest, Result, TestableConstraint};
use matchcore_diagnosis::{
    decompose, CountOracle, DecomposedConstraintSet, DiagnosisConfig, Diagnoser,
    RelaxationAdvisor, RelaxationSuggestion,
};
use matchcore_rules::RuleEngine;

/// Everything a response formatter needs after one pipeline run.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The inferred fact context, with provenance for explainability.
    pub facts: FactContext,
    /// The decomposed constraint set that was (or would have been) searched.
    pub constraints: DecomposedConstraintSet,
    /// Minimal conflict sets; empty when the search found enough matches.
    pub minimal_conflict_sets: Vec<Vec<TestableConstraint>>,
    /// Relaxation suggestions for every conflicting constraint.
    pub suggestions: Vec<RelaxationSuggestion>,
    /// Oracle calls spent on diagnosis (0 when nothing was diagnosed).
    pub oracle_call_count: u64,
}

/// The configured reasoning pipeline: rule engine, strategy table and
/// diagnosis tuning, bound to a count oracle.
pub struct ShortfallPipeline<O> {
    engine: RuleEngine,
    advisor: RelaxationAdvisor,
    diagnosis: DiagnosisConfig,
    max_iterations: usize,
    oracle: O,
}

impl<O: CountOracle + Sync> ShortfallPipeline<O> {
    /// Builds a pipeline from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `MatchCoreError::Config` when the rule set fails engine
    /// validation.
    pub fn new(config: MatchConfig, oracle: O) -> Result<Self> {
        let engine = RuleEngine::new(config.rules)?;
        Ok(Self {
            engine,
            advisor: RelaxationAdvisor::new(config.strategies),
            diagnosis: config.diagnosis,
            max_iterations: config.max_inference_iterations,
            oracle,
        })
    }

    /// The rule engine, for explainability rendering.
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Runs the full flow for one request.
    ///
    /// The diagnoser's initial full-set probe doubles as the shortfall
    /// check: a consistent full set comes back with no conflict sets and
    /// one oracle call spent.
    pub async fn run(&self, request: &ResolvedRequest) -> Result<PipelineOutcome> {
        let facts = self
            .engine
            .infer(request, &request.overridden_rules, self.max_iterations);
        let constraints = decompose(&facts);

        let diagnoser = Diagnoser::new(&constraints, &self.oracle, self.diagnosis);
        let diagnosis = diagnoser.diagnose().await?;

        let mut suggestions = Vec::new();
        for set in &diagnosis.minimal_conflict_sets {
            for constraint in set {
                for suggestion in self.advisor.suggest(constraint)? {
                    if !suggestions.contains(&suggestion) {
                        suggestions.push(suggestion);
                    }
                }
            }
        }

        info!(
            event = "pipeline_run",
            constraints = constraints.len(),
            conflict_sets = diagnosis.minimal_conflict_sets.len(),
            suggestions = suggestions.len(),
            oracle_calls = diagnosis.oracle_call_count,
        );

        Ok(PipelineOutcome {
            facts,
            constraints,
            minimal_conflict_sets: diagnosis.minimal_conflict_sets,
            suggestions,
            oracle_call_count: diagnosis.oracle_call_count,
        })
    }
}
