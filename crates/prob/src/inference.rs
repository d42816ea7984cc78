//! Inference engines for discrete Bayesian networks.
//!
//! Every engine answers three kinds of queries:
//! - marginal: P(X)
//! - conditional: P(X | E=e), which renormalizes over the evidence
//! - interventional: P(X | do(Z=z)), which runs on the mutilated network
//!
//! Key insight: conditioning is NOT intervention. Observing Z=z updates beliefs
//! about Z's causes; forcing Z=z cuts Z off from them.

use crate::dist::Dist;
use crate::error::ProbError;
use crate::factor::Factor;
use crate::network::{BayesNet, Evidence, JointDist};
use tracing::trace;

/// A query service over one Bayesian network.
///
/// Distributions are indexed by state position, with length equal to the
/// query variable's cardinality. Engines are shared across threads when
/// many independent queries are fanned out, hence the `Sync` bound.
pub trait InferenceEngine: Sync {
    /// The network this engine answers queries about.
    fn network(&self) -> &BayesNet;

    /// P(var), with no evidence.
    fn query_marginal(&self, var: usize) -> Result<Dist, ProbError> {
        self.query_conditional(var, &Evidence::new())
    }

    /// P(var | evidence).
    fn query_conditional(&self, var: usize, evidence: &Evidence) -> Result<Dist, ProbError>;

    /// P(var | do(intervention)).
    fn query_interventional(&self, var: usize, intervention: &Evidence)
        -> Result<Dist, ProbError>;
}

/// Sum-product variable elimination.
///
/// Only the ancestors of the query and evidence variables take part: every
/// other variable is barren and sums out to 1. Hidden variables are
/// eliminated greedily, smallest intermediate factor first.
///
/// # Example
///
/// ```rust
/// use bibas_prob::{sprinkler_network, Evidence, InferenceEngine, VariableElimination};
///
/// let net = sprinkler_network();
/// let engine = VariableElimination::new(&net);
///
/// // P(Rain | Cloudy=1)
/// let evidence = Evidence::from([(0, 1)]);
/// let rain = engine.query_conditional(2, &evidence).unwrap();
/// assert!((rain.p[1] - 0.8).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VariableElimination<'a> {
    net: &'a BayesNet,
}

impl<'a> VariableElimination<'a> {
    /// Create a new variable elimination solver.
    pub fn new(net: &'a BayesNet) -> Self {
        Self { net }
    }
}

impl InferenceEngine for VariableElimination<'_> {
    fn network(&self) -> &BayesNet {
        self.net
    }

    fn query_conditional(&self, var: usize, evidence: &Evidence) -> Result<Dist, ProbError> {
        eliminate(self.net, var, evidence)
    }

    fn query_interventional(
        &self,
        var: usize,
        intervention: &Evidence,
    ) -> Result<Dist, ProbError> {
        let mutilated = self.net.intervene_all(intervention)?;
        eliminate(&mutilated, var, &Evidence::new())
    }
}

fn eliminate(net: &BayesNet, query: usize, evidence: &Evidence) -> Result<Dist, ProbError> {
    let n_states = net.cardinality(query)?;
    net.check_evidence(evidence)?;

    let mut roots: Vec<usize> = evidence.keys().copied().collect();
    roots.push(query);
    let relevant = net.ancestors(&roots);

    let mut factors = Vec::new();
    for var in (0..net.n_vars()).filter(|&v| relevant[v]) {
        let factor = evidence
            .iter()
            .fold(Factor::from_cpd(net.cpd(var)?), |f, (&ev, &state)| {
                f.reduce(ev, state)
            });
        factors.push(factor);
    }

    let mut hidden: Vec<usize> = (0..net.n_vars())
        .filter(|&v| relevant[v] && v != query && !evidence.contains_key(&v))
        .collect();
    let mut order = Vec::with_capacity(hidden.len());

    while let Some(var) = next_variable(&factors, &hidden) {
        hidden.retain(|&v| v != var);
        let (touching, rest): (Vec<Factor>, Vec<Factor>) =
            factors.into_iter().partition(|f| f.contains(var));
        let merged = touching
            .iter()
            .fold(Factor::unit(), |acc, f| acc.product(f));
        factors = rest;
        factors.push(merged.sum_out(var));
        order.push(var);
    }
    trace!(query, ?order, "eliminated hidden variables");

    let result = factors
        .iter()
        .fold(Factor::unit(), |acc, f| acc.product(f));

    match evidence.get(&query) {
        // Query was observed: the result is P(evidence), a scalar.
        Some(&state) => {
            if result.values.iter().sum::<f64>() > 0.0 {
                Ok(Dist::point(n_states, state))
            } else {
                Err(ProbError::ImpossibleEvidence)
            }
        }
        None => Dist::from_weights(result.values).map_err(|err| match err {
            ProbError::ZeroWeights => ProbError::ImpossibleEvidence,
            other => other,
        }),
    }
}

/// Pick the hidden variable whose elimination creates the smallest factor.
fn next_variable(factors: &[Factor], hidden: &[usize]) -> Option<usize> {
    hidden.iter().copied().min_by_key(|&var| {
        let mut scope: Vec<(usize, usize)> = Vec::new();
        for f in factors.iter().filter(|f| f.contains(var)) {
            for (&v, &c) in f.vars.iter().zip(&f.cards) {
                if !scope.iter().any(|&(s, _)| s == v) {
                    scope.push((v, c));
                }
            }
        }
        scope.iter().map(|&(_, c)| c).product::<usize>()
    })
}

/// Exact inference engine for Bayesian networks.
///
/// Uses enumeration over the full joint distribution, computed once up front.
/// Suitable for small networks (< 20 binary variables).
#[derive(Debug, Clone)]
pub struct ExactInference<'a> {
    net: &'a BayesNet,
    joint: JointDist,
}

impl<'a> ExactInference<'a> {
    /// Create a new exact inference engine, materializing the joint.
    pub fn new(net: &'a BayesNet) -> Result<Self, ProbError> {
        let joint = net.full_joint()?;
        Ok(Self { net, joint })
    }

    /// The cached joint distribution.
    pub fn joint(&self) -> &JointDist {
        &self.joint
    }

    /// Compute P(evidence) - the probability of the evidence.
    pub fn evidence_prob(&self, evidence: &Evidence) -> f64 {
        self.joint
            .probs
            .iter()
            .enumerate()
            .filter(|&(idx, _)| {
                let assignment = self.joint.decode(idx);
                evidence
                    .iter()
                    .all(|(&var, &val)| assignment.get(var) == Some(&val))
            })
            .map(|(_, &p)| p)
            .sum()
    }
}

impl InferenceEngine for ExactInference<'_> {
    fn network(&self) -> &BayesNet {
        self.net
    }

    fn query_conditional(&self, var: usize, evidence: &Evidence) -> Result<Dist, ProbError> {
        self.net.check_evidence(evidence)?;
        self.joint.condition_on(var, evidence)
    }

    fn query_interventional(
        &self,
        var: usize,
        intervention: &Evidence,
    ) -> Result<Dist, ProbError> {
        let mutilated = self.net.intervene_all(intervention)?;
        mutilated.full_joint()?.marginal(var)
    }
}
