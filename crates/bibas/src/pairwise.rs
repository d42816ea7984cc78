//! Pairwise BIBAS scoring: how much does `source` move a binary `target`?
//!
//! ```text
//! score(S → T) = 100 · Σᵢ P(S=i) · |P(T=+ | S=i) − P(T=+)|
//! ```
//!
//! In observe mode `P(T=+ | S=i)` conditions on evidence; in intervene mode
//! it is `P(T=+ | do(S=i))`. Intervening on a child cannot move its parent,
//! so in intervene mode a target that is a parent of the source scores 0
//! without querying the engine.

use crate::config::{Mode, ScoreConfig};
use crate::error::BibasError;
use crate::score::{Score, MAX_SCORE};
use bibas_prob::{BayesNet, Evidence, InferenceEngine, ProbError, VariableElimination};
use tracing::{debug, warn};

/// Scores single `source → target` pairs against an inference engine.
///
/// # Example
///
/// ```rust
/// use bibas::{PairwiseScorer, Score, ScoreConfig};
/// use bibas_prob::{BayesNet, Dist, Kernel, VariableElimination};
///
/// let mut net = BayesNet::with_variables(&[("A", 2), ("B", 2)]).unwrap();
/// net.add_prior(0, &Dist::new(vec![0.5, 0.5]).unwrap()).unwrap();
/// net.add_conditional(1, vec![0], Kernel::new(vec![
///     vec![0.9, 0.1],
///     vec![0.1, 0.9],
/// ]).unwrap()).unwrap();
///
/// let engine = VariableElimination::new(&net);
/// let scorer = PairwiseScorer::new(&engine);
/// let score = scorer.score("A", "B", &ScoreConfig::default()).unwrap();
/// assert!((score.value().unwrap() - 40.0).abs() < 1e-9);
/// ```
pub struct PairwiseScorer<'e, E: InferenceEngine + ?Sized> {
    engine: &'e E,
}

impl<E: InferenceEngine + ?Sized> Clone for PairwiseScorer<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: InferenceEngine + ?Sized> Copy for PairwiseScorer<'_, E> {}

impl<'e, E: InferenceEngine + ?Sized> PairwiseScorer<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    pub fn network(&self) -> &'e BayesNet {
        self.engine.network()
    }

    /// Score `source → target`.
    ///
    /// Contract violations are returned as errors. Engine failures produce
    /// [`Score::Undefined`] carrying the reason, and are logged.
    pub fn score(
        &self,
        source: &str,
        target: &str,
        config: &ScoreConfig,
    ) -> Result<Score, BibasError> {
        let target_var = self.resolve_target(target, config.positive_state)?;
        let source_var = self.resolve_source(source, target_var)?;
        Ok(self.score_resolved(source_var, target_var, config))
    }

    /// Like [`PairwiseScorer::score`], but engine failures are returned as
    /// [`BibasError::InferenceFailure`] instead of an undefined score.
    pub fn try_score(
        &self,
        source: &str,
        target: &str,
        config: &ScoreConfig,
    ) -> Result<f64, BibasError> {
        let target_var = self.resolve_target(target, config.positive_state)?;
        let source_var = self.resolve_source(source, target_var)?;
        self.shift(source_var, target_var, config)
            .map_err(|cause| BibasError::InferenceFailure {
                source_name: source.to_string(),
                target: target.to_string(),
                cause,
            })
    }

    pub(crate) fn resolve_target(
        &self,
        target: &str,
        positive_state: usize,
    ) -> Result<usize, BibasError> {
        let net = self.network();
        let var = net.index_of(target).ok_or_else(|| BibasError::InvalidTarget {
            name: target.to_string(),
            reason: "not a node of the network".to_string(),
        })?;

        let states = net.var_states()[var];
        if states != 2 {
            return Err(non_binary_target(target, states));
        }
        check_positive_state(target, positive_state)?;
        Ok(var)
    }

    pub(crate) fn resolve_source(
        &self,
        source: &str,
        target_var: usize,
    ) -> Result<usize, BibasError> {
        let var = self
            .network()
            .index_of(source)
            .ok_or_else(|| BibasError::InvalidSource {
                name: source.to_string(),
                reason: "not a node of the network".to_string(),
            })?;
        if var == target_var {
            return Err(BibasError::InvalidSource {
                name: source.to_string(),
                reason: "source and target are the same node".to_string(),
            });
        }
        Ok(var)
    }

    /// Score already-validated indices, absorbing engine failures.
    pub(crate) fn score_resolved(
        &self,
        source: usize,
        target: usize,
        config: &ScoreConfig,
    ) -> Score {
        let (source_name, target_name) = (self.label(source), self.label(target));
        match self.shift(source, target, config) {
            Ok(value) => {
                debug!(
                    source_node = source_name,
                    target_node = target_name,
                    mode = %config.mode,
                    score = value,
                    "computed BIBAS score"
                );
                Score::Defined(value)
            }
            Err(cause) => {
                warn!(
                    source_node = source_name,
                    target_node = target_name,
                    mode = %config.mode,
                    error = %cause,
                    "inference failed, score left undefined"
                );
                let failure = BibasError::InferenceFailure {
                    source_name: source_name.to_string(),
                    target: target_name.to_string(),
                    cause,
                };
                Score::undefined(failure.to_string())
            }
        }
    }

    fn shift(&self, source: usize, target: usize, config: &ScoreConfig) -> Result<f64, ProbError> {
        if config.mode == Mode::Intervene && self.network().is_parent(target, source) {
            debug!(
                source_node = self.label(source),
                target_node = self.label(target),
                "target is a parent of source, causal score is zero"
            );
            return Ok(0.0);
        }

        let positive = config.positive_state;
        let prior = self.engine.query_marginal(target)?.prob(positive)?;
        let weights = self.engine.query_marginal(source)?;

        let mut total = 0.0;
        for (state, &weight) in weights.p.iter().enumerate() {
            // Zero-weight states contribute nothing and cannot be conditioned on.
            if weight <= 0.0 {
                continue;
            }
            let setting = Evidence::from([(source, state)]);
            let shifted = match config.mode {
                Mode::Observe => self.engine.query_conditional(target, &setting)?,
                Mode::Intervene => self.engine.query_interventional(target, &setting)?,
            };
            total += weight * (shifted.prob(positive)? - prior).abs();
        }

        let score = total * MAX_SCORE;
        if !score.is_finite() {
            return Err(ProbError::NonFiniteProbability);
        }
        Ok(score.clamp(0.0, MAX_SCORE))
    }

    fn label(&self, var: usize) -> &'e str {
        self.network().name(var).unwrap_or("?")
    }
}

pub(crate) fn non_binary_target(target: &str, states: usize) -> BibasError {
    BibasError::InvalidTarget {
        name: target.to_string(),
        reason: format!("must be binary, has {states} states"),
    }
}

/// Targets are binary, so the positive state must be 0 or 1.
pub(crate) fn check_positive_state(target: &str, positive_state: usize) -> Result<(), BibasError> {
    if positive_state >= 2 {
        return Err(BibasError::InvalidTarget {
            name: target.to_string(),
            reason: format!("positive state {positive_state} is out of range"),
        });
    }
    Ok(())
}

/// Score `source → target` on `net` with variable elimination.
pub fn bibas_score(
    net: &BayesNet,
    source: &str,
    target: &str,
    config: &ScoreConfig,
) -> Result<Score, BibasError> {
    let engine = VariableElimination::new(net);
    PairwiseScorer::new(&engine).score(source, target, config)
}
