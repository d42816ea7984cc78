//! Causal inference: interventions via graph surgery.
//!
//! Key insight: do(X=x) ≠ observing X=x
//! - Observing: Updates beliefs about causes of X
//! - Intervening: Breaks the causal mechanism, isolates X's effect
//!
//! `do(X=x)` builds a *mutilated* network: X's CPD becomes a point mass on
//! `x` and every edge into X is removed. Everything else is untouched.

use crate::dist::Dist;
use crate::error::ProbError;
use crate::inference::{InferenceEngine, VariableElimination};
use crate::kernel::Kernel;
use crate::network::{BayesNet, Evidence};

impl BayesNet {
    /// The network under `do(var = state)`.
    ///
    /// `self` is left untouched; the surgery happens on a clone.
    pub fn intervene(&self, var: usize, state: usize) -> Result<BayesNet, ProbError> {
        self.intervene_all(&Evidence::from([(var, state)]))
    }

    /// The network under a joint intervention on several variables.
    pub fn intervene_all(&self, intervention: &Evidence) -> Result<BayesNet, ProbError> {
        self.check_evidence(intervention)?;
        let mut mutilated = self.clone();
        for (&var, &state) in intervention {
            mutilated.replace_with_prior(var, &Dist::point(self.var_states()[var], state));
        }
        Ok(mutilated)
    }
}

/// Compute P(Y | do(X=x)) - the interventional distribution.
///
/// # Example
///
/// ```rust
/// use bibas_prob::{interventional_query, sprinkler_network};
///
/// let net = sprinkler_network();
///
/// // P(Cloudy | do(Sprinkler=1)) is just the prior of Cloudy
/// let p = interventional_query(&net, 0, 1, 1).unwrap();
/// assert!((p.p[1] - 0.5).abs() < 1e-9);
/// ```
pub fn interventional_query(
    net: &BayesNet,
    query_var: usize,
    intervention_var: usize,
    intervention_value: usize,
) -> Result<Dist, ProbError> {
    VariableElimination::new(net)
        .query_interventional(query_var, &Evidence::from([(intervention_var, intervention_value)]))
}

/// Create a smoking/cancer example network with confounding.
///
/// Structure:
/// ```text
///        Genotype (G)
///        ↙        ↘
///   Smoking (S) → Tar (T) → Cancer (C)
/// ```
pub fn smoking_cancer_network() -> BayesNet {
    build_smoking_cancer().expect("smoking/cancer CPTs are well-formed")
}

fn build_smoking_cancer() -> Result<BayesNet, ProbError> {
    let mut net = BayesNet::with_variables(&[
        ("Genotype", 2),
        ("Smoking", 2),
        ("Tar", 2),
        ("Cancer", 2),
    ])?;

    net.add_prior(0, &Dist::new(vec![0.7, 0.3])?)?;

    // P(S|G)
    net.add_conditional(1, vec![0], Kernel::new(vec![vec![0.8, 0.2], vec![0.3, 0.7]])?)?;

    // P(T|S)
    net.add_conditional(2, vec![1], Kernel::new(vec![vec![0.95, 0.05], vec![0.2, 0.8]])?)?;

    // P(C|G,T), rows G*2 + T
    net.add_conditional(
        3,
        vec![0, 2],
        Kernel::new(vec![
            vec![0.98, 0.02],
            vec![0.85, 0.15],
            vec![0.90, 0.10],
            vec![0.60, 0.40],
        ])?,
    )?;

    Ok(net)
}
