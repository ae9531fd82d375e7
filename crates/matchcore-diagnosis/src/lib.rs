//! MatchCore Diagnosis - why did this search come back empty?
//!
//! When the full constraint set of a request matches too few candidates,
//! this crate finds out which constraints are to blame and what to do
//! about it:
//! - [`decompose`] turns a fact context into independently testable
//!   atomic constraints plus a pure count-query builder
//! - [`Diagnoser`] runs QuickXplain against an async [`CountOracle`] to
//!   find minimal conflict sets
//! - [`RelaxationAdvisor`] converts each conflicting constraint into
//!   ranked, human-readable relaxation suggestions

pub mod decompose;
pub mod diagnose;
pub mod oracle;
pub mod relax;

#[cfg(test)]
pub(crate) mod test_utils;

pub use decompose::{decompose, CountQuery, DecomposedConstraintSet};
pub use diagnose::{DiagnosisConfig, DiagnosisResult, Diagnoser};
pub use oracle::{CountOracle, OracleError};
pub use relax::{RelaxationAdvisor, RelaxationStrategy, RelaxationSuggestion, SkillRationales};
