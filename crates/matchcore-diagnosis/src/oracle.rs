//! The count oracle boundary.

use std::collections::BTreeSet;
use std::future::Future;

use thiserror::Error;

/// Failure reported by a count oracle.
///
/// Timeouts are reported the same way as any other failure; the diagnoser
/// never retries and never maps a failure to a count.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OracleError {
    pub message: String,
}

impl OracleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Asynchronous candidate-count oracle.
///
/// Implementations execute the count query for a subset of constraint ids
/// against the backing store. The contract the diagnoser depends on:
///
/// - deterministic for a fixed subset within one request's lifetime
///   (the backing data must not shift mid-diagnosis)
/// - errors are reported as errors, never as a magic count such as 0
///
/// Cancellation is cooperative: dropping the diagnosis future drops any
/// in-flight `count` call.
pub trait CountOracle {
    /// Counts candidates matching exactly the given constraint subset.
    fn count(
        &self,
        subset: &BTreeSet<String>,
    ) -> impl Future<Output = Result<u64, OracleError>> + Send;
}
