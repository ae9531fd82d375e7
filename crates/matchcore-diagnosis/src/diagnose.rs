//! QuickXplain conflict diagnosis.
//!
//! Given a decomposed constraint set and a count oracle, finds one or more
//! minimal conflict sets: subsets that match too few candidates while
//! every proper subset matches enough. Minimality is the correctness
//! contract of the whole subsystem, so the recursive structure below must
//! not be replaced by brute-force subset enumeration; the divide-and-
//! conquer shape is also what keeps oracle usage at O(k*log(n/k)) for a
//! conflict of size k among n constraints.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info, trace};

use matchcore_core::{MatchCoreError, Result, TestableConstraint};

use crate::decompose::DecomposedConstraintSet;
use crate::oracle::CountOracle;

/// Conflict ids; conflicts are nearly always tiny.
type ConflictIds = SmallVec<[String; 4]>;

/// Tuning knobs for one diagnosis run.
///
/// Both knobs are caller-configurable with documented defaults; share one
/// value per deployment or build one per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiagnosisConfig {
    /// Upper bound on distinct minimal conflict sets to report.
    #[serde(default = "default_max_sets")]
    pub max_sets: usize,
    /// A count below this is "too few results" (inconsistent).
    #[serde(default = "default_threshold")]
    pub insufficient_threshold: u64,
}

fn default_max_sets() -> usize {
    3
}

fn default_threshold() -> u64 {
    3
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            max_sets: default_max_sets(),
            insufficient_threshold: default_threshold(),
        }
    }
}

/// Outcome of one diagnosis run.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisResult {
    /// Each inner list is a minimal conflict set in decomposition order.
    /// Empty when the full set was already consistent.
    pub minimal_conflict_sets: Vec<Vec<TestableConstraint>>,
    /// Total oracle calls issued.
    pub oracle_call_count: u64,
}

/// One diagnosis run over a decomposed constraint set.
///
/// Owns no request state beyond borrows; create one per request. Oracle
/// calls within one recursive `search` invocation are inherently
/// sequential (the right half's result feeds the left half's background).
/// The secondary loop that looks for additional sets has independent
/// iterations and could run concurrently; this implementation keeps it
/// sequential, and any concurrent variant must match it in membership
/// and minimality.
pub struct Diagnoser<'a, O> {
    decomposed: &'a DecomposedConstraintSet,
    oracle: &'a O,
    config: DiagnosisConfig,
    calls: AtomicU64,
}

impl<'a, O: CountOracle + Sync> Diagnoser<'a, O> {
    pub fn new(decomposed: &'a DecomposedConstraintSet, oracle: &'a O, config: DiagnosisConfig) -> Self {
        Self {
            decomposed,
            oracle,
            config,
            calls: AtomicU64::new(0),
        }
    }

    /// Runs the full diagnosis.
    ///
    /// Trivial cases are not errors: zero constraints or an already
    /// consistent full set return an empty conflict list. An oracle error
    /// aborts the whole run; partial results are discarded rather than
    /// returned as if complete.
    pub async fn diagnose(&self) -> Result<DiagnosisResult> {
        let all_ids: Vec<String> = self
            .decomposed
            .constraints()
            .iter()
            .map(|c| c.id.clone())
            .collect();

        if all_ids.is_empty() {
            return Ok(self.result(Vec::new()));
        }

        let full: BTreeSet<String> = all_ids.iter().cloned().collect();
        if !self.is_insufficient(&full).await? {
            debug!(event = "diagnosis_consistent", constraints = all_ids.len());
            return Ok(self.result(Vec::new()));
        }

        let Some(first) = self.search(BTreeSet::new(), false, &all_ids).await? else {
            return Ok(self.result(Vec::new()));
        };

        let mut signatures = BTreeSet::new();
        signatures.insert(sorted_signature(&first));
        let mut sets = vec![first.clone()];

        // Hitting-set enumeration: a minimal set found without constraint
        // `c` in the pool cannot contain `c`, so it differs from the first.
        for blocker in first.iter() {
            if sets.len() >= self.config.max_sets {
                break;
            }
            let pool: Vec<String> = all_ids.iter().filter(|id| *id != blocker).cloned().collect();
            if pool.is_empty() {
                continue;
            }
            let pool_set: BTreeSet<String> = pool.iter().cloned().collect();
            if !self.is_insufficient(&pool_set).await? {
                continue;
            }
            if let Some(found) = self.search(BTreeSet::new(), false, &pool).await? {
                if !found.is_empty() && signatures.insert(sorted_signature(&found)) {
                    sets.push(found);
                }
            }
        }

        info!(
            event = "diagnosis_complete",
            conflict_sets = sets.len(),
            oracle_calls = self.calls.load(Ordering::Relaxed),
        );
        Ok(self.result(sets))
    }

    /// Core QuickXplain recursion.
    ///
    /// Returns `Some(ids)` for the minimal conflict contribution of this
    /// branch, `None` when no conflict exists on this branch (only
    /// possible with empty candidates). `delta_added` records whether the
    /// caller grew the background since it was last proven consistent;
    /// only then is re-testing the background worthwhile. That early exit
    /// is what gives the algorithm its logarithmic call bound.
    fn search<'s>(
        &'s self,
        background: BTreeSet<String>,
        delta_added: bool,
        candidates: &'s [String],
    ) -> Pin<Box<dyn Future<Output = Result<Option<ConflictIds>>> + Send + 's>> {
        Box::pin(async move {
            if delta_added && self.is_insufficient(&background).await? {
                // The conflict lives entirely in the background.
                return Ok(Some(ConflictIds::new()));
            }
            if candidates.is_empty() {
                return Ok(None);
            }
            if candidates.len() == 1 {
                let mut ids = ConflictIds::new();
                ids.push(candidates[0].clone());
                return Ok(Some(ids));
            }

            let mid = candidates.len() / 2;
            let (left, right) = candidates.split_at(mid);

            let mut with_left = background.clone();
            with_left.extend(left.iter().cloned());
            let Some(right_part) = self.search(with_left, !left.is_empty(), right).await? else {
                return Ok(None);
            };

            let mut with_right_part = background;
            with_right_part.extend(right_part.iter().cloned());
            let left_part = self
                .search(with_right_part, !right_part.is_empty(), left)
                .await?
                .unwrap_or_default();

            let mut combined = left_part;
            for id in right_part {
                if !combined.contains(&id) {
                    combined.push(id);
                }
            }
            Ok(Some(combined))
        })
    }

    /// One oracle probe: is this subset's count below the threshold?
    async fn is_insufficient(&self, subset: &BTreeSet<String>) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let count = self
            .oracle
            .count(subset)
            .await
            .map_err(|e| MatchCoreError::Oracle {
                subset: subset.iter().cloned().collect(),
                message: e.message,
            })?;
        trace!(
            event = "oracle_probe",
            subset_size = subset.len(),
            count = count,
        );
        Ok(count < self.config.insufficient_threshold)
    }

    fn result(&self, sets: Vec<ConflictIds>) -> DiagnosisResult {
        // Present each set in decomposition order, resolved to full
        // constraint values.
        let minimal_conflict_sets = sets
            .into_iter()
            .map(|ids| {
                self.decomposed
                    .constraints()
                    .iter()
                    .filter(|c| ids.contains(&c.id))
                    .cloned()
                    .collect()
            })
            .collect();
        DiagnosisResult {
            minimal_conflict_sets,
            oracle_call_count: self.calls.load(Ordering::Relaxed),
        }
    }
}

fn sorted_signature(ids: &ConflictIds) -> Vec<String> {
    let mut sig: Vec<String> = ids.iter().cloned().collect();
    sig.sort();
    sig
}
