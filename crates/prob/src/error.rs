//! Error types for probability and network operations.

use thiserror::Error;

/// Errors that can occur while building or querying a Bayesian network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbError {
    /// Distribution doesn't sum to 1.
    #[error("Distribution not normalized: sum = {sum} (expected 1.0)")]
    NotNormalized { sum: f64 },

    /// Negative probability encountered.
    #[error("Negative probability encountered")]
    NegativeProbability,

    /// NaN or infinite entry in a distribution, table or query result.
    #[error("Probability is not a finite number")]
    NonFiniteProbability,

    /// All weights are zero (can't normalize).
    #[error("Cannot normalize: all weights are zero")]
    ZeroWeights,

    /// Empty distribution.
    #[error("Distribution cannot be empty")]
    EmptyDistribution,

    /// Empty kernel.
    #[error("Kernel cannot be empty")]
    EmptyKernel,

    /// Rows have different lengths.
    #[error("Kernel has ragged rows (rows have different lengths)")]
    RaggedMatrix,

    /// A row doesn't sum to 1.
    #[error("Row {row} not normalized: sum = {sum} (expected 1.0)")]
    RowNotNormalized { row: usize, sum: f64 },

    /// Shape mismatch between a table and the variables it describes.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// Index out of bounds.
    #[error("Index {index} out of bounds for size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    /// No variable with this name exists in the network.
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    /// A variable with this name was already declared.
    #[error("Variable '{0}' is declared twice")]
    DuplicateVariable(String),

    /// Variables need at least two states.
    #[error("Variable '{variable}' has {states} state(s); at least 2 are required")]
    InvalidCardinality { variable: String, states: usize },

    /// The variable has no conditional distribution attached.
    #[error("Variable '{0}' has no conditional distribution")]
    MissingCpd(String),

    /// The variable already has a conditional distribution.
    #[error("Variable '{0}' already has a conditional distribution")]
    DuplicateCpd(String),

    /// The same parent was listed twice for one variable.
    #[error("Parent '{parent}' listed twice for '{child}'")]
    DuplicateParent { child: String, parent: String },

    /// Adding the edge would make the graph cyclic.
    #[error("Edge {parent} -> {child} would create a directed cycle")]
    Cycle { parent: String, child: String },

    /// A state index is not valid for the variable.
    #[error("State {state} out of range for '{variable}' ({states} states)")]
    StateOutOfRange {
        variable: String,
        state: usize,
        states: usize,
    },

    /// Conditioning on an assignment that has probability zero.
    #[error("Evidence has zero probability")]
    ImpossibleEvidence,

    /// A network document could not be parsed.
    #[error("Failed to parse network document: {0}")]
    Parse(String),
}
