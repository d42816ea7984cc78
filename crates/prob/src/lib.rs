//! # bibas-prob - Discrete Bayesian Networks
//!
//! The inference service behind BIBAS scoring: discrete distributions,
//! conditional probability tables, DAG-structured networks, and engines that
//! answer marginal, conditional and interventional queries.
//!
//! ## Core Concepts
//!
//! - **Distributions** ([`Dist`]): probability vectors indexed by state
//! - **CPTs** ([`Kernel`], [`Cpd`]): row-stochastic matrices, one row per
//!   parent configuration
//! - **Networks** ([`BayesNet`]): variables, CPDs and a `petgraph` DAG
//! - **Engines** ([`InferenceEngine`]): [`VariableElimination`] for real
//!   networks, [`ExactInference`] (full-joint enumeration) for small ones
//! - **Interventions**: `do(X=x)` as graph surgery on a cloned network
//!
//! ## Example
//!
//! ```rust
//! use bibas_prob::{sprinkler_network, Evidence, InferenceEngine, VariableElimination};
//!
//! let net = sprinkler_network();
//! let engine = VariableElimination::new(&net);
//!
//! let wet = engine.query_marginal(3).unwrap();
//! let wet_do_rain = engine.query_interventional(3, &Evidence::from([(2, 1)])).unwrap();
//! assert!(wet_do_rain.p[1] > wet.p[1]);
//! ```

mod causal;
mod dist;
mod document;
mod error;
mod factor;
mod inference;
mod kernel;
mod network;

pub use causal::{interventional_query, smoking_cancer_network};
pub use dist::Dist;
pub use document::{NetworkDocument, VariableDocument};
pub use error::ProbError;
pub use factor::Factor;
pub use inference::{ExactInference, InferenceEngine, VariableElimination};
pub use kernel::Kernel;
pub use network::{sprinkler_network, BayesNet, Cpd, Evidence, JointDist};

/// Tolerance for probability comparisons.
pub const PROB_TOLERANCE: f64 = 1e-6;
