//! MatchCore Core - Core types for the candidate-matching reasoning core
//!
//! This crate provides the fundamental value types shared by the rest of
//! the workspace:
//! - Testable constraints (field, operator, value) for count queries
//! - The per-request fact context with provenance tracking
//! - The resolved hiring request consumed from the validation layer
//! - The workspace-wide error type

pub mod constraint;
pub mod error;
pub mod facts;


pub use constraint::{CompareOp, FieldValue, TestableConstraint};
pub use error::{MatchCoreError, Result};
pub use facts::{FactContext, FactPath, ProvenanceChain, ResolvedRequest, SkillRequirement};
