//! # bibas - Bayesian Influence Scores
//!
//! How strongly does a source variable move a binary target in a discrete
//! Bayesian network? The BIBAS score answers with one number in `[0, 100]`:
//! the expected absolute shift of `P(target = positive)` when the source is
//! set to each of its states, weighted by the source's own marginal.
//!
//! ## Core Concepts
//!
//! - **Pairwise** ([`PairwiseScorer`]): one `source → target` score, observed
//!   ([`Mode::Observe`]) or forced with `do(·)` ([`Mode::Intervene`])
//! - **Ranking** ([`TargetRanker`]): every other node scored against one
//!   target, descending
//! - **Matrix** ([`MatrixBuilder`]): every ordered pair of distinct nodes
//! - **Score** ([`Score`]): defined value or undefined with a reason, never
//!   conflated with zero
//!
//! Queries go through any [`bibas_prob::InferenceEngine`]; the free functions
//! use [`bibas_prob::VariableElimination`].
//!
//! ## Example
//!
//! ```rust
//! use bibas::{rank_sources, Mode, RankConfig};
//! use bibas_prob::sprinkler_network;
//!
//! let net = sprinkler_network();
//! let ranking = rank_sources(&net, "WetGrass", &RankConfig::new(Mode::Intervene)).unwrap();
//!
//! assert_eq!(ranking.len(), 3);
//! assert_eq!(ranking.entries[0].source, "Rain");
//! ```

mod config;
mod error;
mod matrix;
mod pairwise;
mod ranking;
mod score;

pub use config::{BinaryPolicy, MatrixConfig, Mode, NodeOrder, RankConfig, ScoreConfig};
pub use error::BibasError;
pub use matrix::{score_matrix, MatrixBuilder, MatrixEntry, ScoreMatrix};
pub use pairwise::{bibas_score, PairwiseScorer};
pub use ranking::{rank_sources, RankedSource, Ranking, TargetRanker};
pub use score::{Score, MAX_SCORE};
