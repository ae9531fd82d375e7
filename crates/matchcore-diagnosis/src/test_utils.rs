//! Shared test fixtures for diagnosis tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use matchcore_core::{CompareOp, FieldValue, TestableConstraint};

use crate::decompose::DecomposedConstraintSet;
use crate::oracle::{CountOracle, OracleError};

/// Builds a decomposed set directly from bare ids, for oracle-driven tests
/// that do not care about fields or values.
pub fn constraint_set(ids: &[&str]) -> DecomposedConstraintSet {
    let constraints = ids
        .iter()
        .map(|id| {
            TestableConstraint::new(
                *id,
                format!("field_{id}"),
                CompareOp::Eq,
                FieldValue::text(*id),
                format!("constraint {id}"),
            )
        })
        .collect();
    DecomposedConstraintSet::from_constraints(constraints)
}

/// Table-driven synthetic oracle keyed by sorted-id signature.
///
/// Counts every call; unknown subsets fall back to the configured default,
/// and a subset listed as failing reports an error instead of a count.
pub struct TableOracle {
    counts: BTreeMap<Vec<String>, u64>,
    default: u64,
    fail_on: Option<Vec<String>>,
    calls: AtomicU64,
}

impl TableOracle {
    pub fn new(default: u64) -> Self {
        Self {
            counts: BTreeMap::new(),
            default,
            fail_on: None,
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_count(mut self, ids: &[&str], count: u64) -> Self {
        self.counts.insert(signature(ids), count);
        self
    }

    pub fn failing_on(mut self, ids: &[&str]) -> Self {
        self.fail_on = Some(signature(ids));
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl CountOracle for TableOracle {
    async fn count(&self, subset: &BTreeSet<String>) -> Result<u64, OracleError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let key: Vec<String> = subset.iter().cloned().collect();
        if self.fail_on.as_ref() == Some(&key) {
            return Err(OracleError::new("synthetic failure"));
        }
        Ok(self.counts.get(&key).copied().unwrap_or(self.default))
    }
}

/// An oracle defined by a predicate over the subset, convenient for
/// injected-conflict property tests: the count is low exactly when the
/// subset includes the whole injected conflict.
pub struct InjectedConflictOracle {
    conflict: Vec<String>,
    calls: AtomicU64,
}

impl InjectedConflictOracle {
    pub fn new(conflict: &[&str]) -> Self {
        Self {
            conflict: conflict.iter().map(|s| s.to_string()).collect(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl CountOracle for InjectedConflictOracle {
    async fn count(&self, subset: &BTreeSet<String>) -> Result<u64, OracleError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let conflicting = self.conflict.iter().all(|id| subset.contains(id));
        Ok(if conflicting { 0 } else { 100 })
    }
}

fn signature(ids: &[&str]) -> Vec<String> {
    let mut sig: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    sig.sort();
    sig
}
