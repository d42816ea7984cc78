//! Rank every other node by its BIBAS impact on one target.

use crate::config::{Mode, RankConfig};
use crate::error::BibasError;
use crate::pairwise::PairwiseScorer;
use crate::score::Score;
use bibas_prob::{BayesNet, InferenceEngine, VariableElimination};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

/// One source and its score against the ranking's target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSource {
    pub source: String,
    pub score: Score,
}

/// Sources ordered by descending score.
///
/// Equal scores keep the network's declaration order; undefined scores come
/// last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub target: String,
    pub mode: Mode,
    pub entries: Vec<RankedSource>,
}

impl Ranking {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The score of `source`, if it was ranked.
    pub fn get(&self, source: &str) -> Option<&Score> {
        self.entries
            .iter()
            .find(|e| e.source == source)
            .map(|e| &e.score)
    }

    /// The `n` highest-ranked sources.
    pub fn top(&self, n: usize) -> &[RankedSource] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Number of sources with a defined score.
    pub fn defined_count(&self) -> usize {
        self.entries.iter().filter(|e| e.score.is_defined()).count()
    }

    /// Each score divided by the largest defined one, in ranking order.
    ///
    /// All zeros when the largest score is zero; undefined scores stay `None`.
    pub fn relative_impacts(&self) -> Vec<(&str, Option<f64>)> {
        let max = self
            .entries
            .iter()
            .filter_map(|e| e.score.value())
            .fold(0.0_f64, f64::max);
        self.entries
            .iter()
            .map(|e| {
                let rel = e
                    .score
                    .value()
                    .map(|v| if max > 0.0 { v / max } else { 0.0 });
                (e.source.as_str(), rel)
            })
            .collect()
    }
}

/// Ranks sources for a target against one inference engine.
pub struct TargetRanker<'e, E: InferenceEngine + ?Sized> {
    scorer: PairwiseScorer<'e, E>,
}

impl<'e, E: InferenceEngine + ?Sized> TargetRanker<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self {
            scorer: PairwiseScorer::new(engine),
        }
    }

    /// Score every node other than `target` and sort by descending score.
    ///
    /// Fails only if the target itself is invalid. Sources whose inference
    /// fails appear with an undefined score.
    pub fn rank(&self, target: &str, config: &RankConfig) -> Result<Ranking, BibasError> {
        let net = self.scorer.network();
        let score_config = config.score;
        let target_var = self.scorer.resolve_target(target, score_config.positive_state)?;

        let span = info_span!("rank", target_node = target, mode = %score_config.mode);
        let sources: Vec<usize> = (0..net.n_vars()).filter(|&v| v != target_var).collect();
        let score_one = |&source: &usize| {
            span.in_scope(|| RankedSource {
                source: net.names()[source].clone(),
                score: self.scorer.score_resolved(source, target_var, &score_config),
            })
        };

        let mut entries: Vec<RankedSource> = if config.parallel {
            sources.par_iter().map(score_one).collect()
        } else {
            sources.iter().map(score_one).collect()
        };
        entries.sort_by(|a, b| a.score.cmp_desc(&b.score));

        span.in_scope(|| debug!(sources = entries.len(), "ranked sources"));
        Ok(Ranking {
            target: target.to_string(),
            mode: score_config.mode,
            entries,
        })
    }
}

/// Rank every source for `target` on `net` with variable elimination.
pub fn rank_sources(
    net: &BayesNet,
    target: &str,
    config: &RankConfig,
) -> Result<Ranking, BibasError> {
    let engine = VariableElimination::new(net);
    TargetRanker::new(&engine).rank(target, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibas_prob::{sprinkler_network, Dist, Evidence, Kernel, ProbError};

    /// A influences C strongly, B weakly, D not at all.
    fn fan_in() -> BayesNet {
        let mut net =
            BayesNet::with_variables(&[("A", 2), ("B", 2), ("D", 2), ("C", 2)]).unwrap();
        net.add_prior(0, &Dist::uniform(2)).unwrap();
        net.add_prior(1, &Dist::uniform(2)).unwrap();
        net.add_prior(2, &Dist::uniform(2)).unwrap();
        // rows A*2 + B
        net.add_conditional(
            3,
            vec![0, 1],
            Kernel::new(vec![
                vec![0.9, 0.1],
                vec![0.8, 0.2],
                vec![0.2, 0.8],
                vec![0.1, 0.9],
            ])
            .unwrap(),
        )
        .unwrap();
        net
    }

    /// Engine that fails every query conditioned on or forcing `broken`.
    struct BrokenSourceEngine<'a> {
        inner: VariableElimination<'a>,
        broken: usize,
    }

    impl InferenceEngine for BrokenSourceEngine<'_> {
        fn network(&self) -> &BayesNet {
            self.inner.network()
        }

        fn query_conditional(&self, var: usize, evidence: &Evidence) -> Result<Dist, ProbError> {
            if evidence.contains_key(&self.broken) {
                return Err(ProbError::ImpossibleEvidence);
            }
            self.inner.query_conditional(var, evidence)
        }

        fn query_interventional(
            &self,
            var: usize,
            intervention: &Evidence,
        ) -> Result<Dist, ProbError> {
            if intervention.contains_key(&self.broken) {
                return Err(ProbError::ImpossibleEvidence);
            }
            self.inner.query_interventional(var, intervention)
        }
    }

    #[test]
    fn test_rank_order() {
        let net = fan_in();
        let ranking = rank_sources(&net, "C", &RankConfig::default()).unwrap();
        let order: Vec<&str> = ranking.entries.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "D"]);
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking.defined_count(), 3);

        // P(C=1) = 0.5; A shifts by 0.35, B by 0.05
        assert!((ranking.get("A").unwrap().value().unwrap() - 35.0).abs() < 1e-9);
        assert!((ranking.get("B").unwrap().value().unwrap() - 5.0).abs() < 1e-9);
        assert!(ranking.get("D").unwrap().value().unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let mut net =
            BayesNet::with_variables(&[("Z", 2), ("Y", 2), ("X", 2), ("T", 2)]).unwrap();
        for v in 0..3 {
            net.add_prior(v, &Dist::uniform(2)).unwrap();
        }
        net.add_prior(3, &Dist::new(vec![0.3, 0.7]).unwrap()).unwrap();

        let ranking = rank_sources(&net, "T", &RankConfig::default()).unwrap();
        let order: Vec<&str> = ranking.entries.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(order, vec!["Z", "Y", "X"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let net = sprinkler_network();
        let mut config = RankConfig::new(Mode::Intervene);
        let parallel = rank_sources(&net, "WetGrass", &config).unwrap();
        config.parallel = false;
        let sequential = rank_sources(&net, "WetGrass", &config).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_intervene_ranking_zeroes_parents() {
        let net = sprinkler_network();
        let ranking = rank_sources(&net, "Cloudy", &RankConfig::new(Mode::Intervene)).unwrap();
        // Every other node is a descendant of Cloudy.
        for entry in &ranking.entries {
            assert!(entry.score.value().unwrap().abs() < 1e-9, "{}", entry.source);
        }
    }

    #[test]
    fn test_invalid_target() {
        let net = fan_in();
        assert!(matches!(
            rank_sources(&net, "Nope", &RankConfig::default()),
            Err(BibasError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_relative_impacts_and_top() {
        let net = fan_in();
        let ranking = rank_sources(&net, "C", &RankConfig::default()).unwrap();
        let rel = ranking.relative_impacts();
        assert_eq!(rel[0], ("A", Some(1.0)));
        assert!((rel[1].1.unwrap() - 5.0 / 35.0).abs() < 1e-9);
        assert_eq!(rel.len(), 3);
        assert_eq!(ranking.top(2).len(), 2);
        assert_eq!(ranking.top(10).len(), 3);
    }

    #[test]
    fn test_single_node_network() {
        let mut net = BayesNet::with_variables(&[("T", 2)]).unwrap();
        net.add_prior(0, &Dist::uniform(2)).unwrap();
        let ranking = rank_sources(&net, "T", &RankConfig::default()).unwrap();
        assert!(ranking.is_empty());
        assert!(ranking.relative_impacts().is_empty());
    }

    #[test]
    fn test_failing_source_ranks_last() {
        let net = fan_in();
        let engine = BrokenSourceEngine {
            inner: VariableElimination::new(&net),
            broken: 0,
        };

        for mode in [Mode::Observe, Mode::Intervene] {
            for parallel in [true, false] {
                let mut config = RankConfig::new(mode);
                config.parallel = parallel;
                let ranking = TargetRanker::new(&engine).rank("C", &config).unwrap();

                let order: Vec<&str> = ranking.entries.iter().map(|e| e.source.as_str()).collect();
                assert_eq!(order, vec!["B", "D", "A"], "{mode}");
                assert_eq!(ranking.len(), 3);
                assert_eq!(ranking.defined_count(), 2);

                let last = &ranking.entries[2];
                assert!(!last.score.is_defined());
                assert!(ranking.entries[..2].iter().all(|e| e.score.is_defined()));
                assert!((ranking.get("B").unwrap().value().unwrap() - 5.0).abs() < 1e-9);
            }
        }
    }
}
