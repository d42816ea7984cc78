//! # Error Types
//!
//! Two kinds of failure exist when scoring:
//!
//! - **Contract violations** (bad target, bad source, unknown mode, unknown
//!   node): the caller asked for something undefined. These are returned as
//!   `Err` and never silently turned into a score.
//! - **Engine failures** (impossible evidence, missing CPD, ...): the question
//!   was well-formed but could not be answered. [`crate::PairwiseScorer::score`]
//!   absorbs these into [`crate::Score::Undefined`]; `InferenceFailure` is
//!   what the non-absorbing path reports.

use bibas_prob::ProbError;
use thiserror::Error;

/// Errors produced by the scoring API.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BibasError {
    /// Target variable is missing, non-binary, or the positive state is invalid.
    #[error("Invalid target '{name}': {reason}")]
    InvalidTarget { name: String, reason: String },

    /// Source variable is missing or equal to the target.
    #[error("Invalid source '{name}': {reason}")]
    InvalidSource { name: String, reason: String },

    /// Requested mode is neither observe nor intervene.
    #[error("Unknown mode '{0}' (expected 'observe' or 'intervene')")]
    UnknownMode(String),

    /// The inference engine could not answer a query.
    #[error("Inference failed for {source_name} -> {target}: {cause}")]
    InferenceFailure {
        source_name: String,
        target: String,
        cause: ProbError,
    },

    /// A node list names a variable the network does not have.
    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    /// A node list names the same variable twice.
    #[error("Node '{0}' listed more than once")]
    DuplicateNode(String),

    /// Strict matrix building requires every node to be binary.
    #[error("All nodes must be binary; non-binary: {}", .nodes.join(", "))]
    NonBinaryNetwork { nodes: Vec<String> },

    /// A configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
