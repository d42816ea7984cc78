//! The full pairwise score matrix, and per-edge scores.
//!
//! A matrix over `n` nodes holds exactly `n(n-1)` cells, stored row-major by
//! source then target. The diagonal is absent: a node is never scored
//! against itself.

use crate::config::{BinaryPolicy, MatrixConfig, Mode, NodeOrder, ScoreConfig};
use crate::error::BibasError;
use crate::pairwise::{check_positive_state, non_binary_target, PairwiseScorer};
use crate::score::Score;
use bibas_prob::{BayesNet, InferenceEngine, VariableElimination};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info_span};

/// One `source → target` cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub source: String,
    pub target: String,
    pub score: Score,
}

/// Scores for every ordered pair of distinct nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMatrix {
    pub mode: Mode,
    nodes: Vec<String>,
    entries: Vec<MatrixEntry>,
}

impl ScoreMatrix {
    /// Node order of the rows and columns.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatrixEntry> {
        self.entries.iter()
    }

    /// The cell for `source → target`. `None` on the diagonal or for nodes
    /// outside the matrix.
    pub fn get(&self, source: &str, target: &str) -> Option<&Score> {
        let n = self.nodes.len();
        let row = self.nodes.iter().position(|s| s == source)?;
        let col = self.nodes.iter().position(|t| t == target)?;
        if row == col {
            return None;
        }
        // Each row skips its diagonal cell.
        let offset = if col > row { col - 1 } else { col };
        self.entries.get(row * (n - 1) + offset).map(|e| &e.score)
    }

    /// Dense `n × n` rows of defined values, for masked rendering.
    ///
    /// The diagonal and undefined cells are `None`.
    pub fn grid(&self) -> Vec<Vec<Option<f64>>> {
        self.nodes
            .iter()
            .map(|source| {
                self.nodes
                    .iter()
                    .map(|target| self.get(source, target).and_then(Score::value))
                    .collect()
            })
            .collect()
    }
}

/// Builds score matrices against one inference engine.
pub struct MatrixBuilder<'e, E: InferenceEngine + ?Sized> {
    scorer: PairwiseScorer<'e, E>,
}

impl<'e, E: InferenceEngine + ?Sized> MatrixBuilder<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self {
            scorer: PairwiseScorer::new(engine),
        }
    }

    /// Score every ordered pair of distinct nodes.
    ///
    /// `nodes` restricts and orders the matrix; without it every network
    /// node is used in [`MatrixConfig::order`].
    pub fn build(
        &self,
        nodes: Option<&[&str]>,
        config: &MatrixConfig,
    ) -> Result<ScoreMatrix, BibasError> {
        let net = self.scorer.network();
        let vars = match nodes {
            Some(names) => resolve_nodes(net, names)?,
            None => default_nodes(net, config.order),
        };

        if config.binary_policy == BinaryPolicy::Strict {
            let non_binary: Vec<String> = vars
                .iter()
                .filter(|&&v| net.var_states()[v] != 2)
                .map(|&v| net.names()[v].clone())
                .collect();
            if !non_binary.is_empty() {
                return Err(BibasError::NonBinaryNetwork { nodes: non_binary });
            }
        }

        let score_config = config.score;
        let names = net.names();
        if let Some(&first) = vars.first() {
            check_positive_state(&names[first], score_config.positive_state)?;
        }

        // Only lenient mode still has non-binary nodes here; their columns
        // become undefined cells.
        let targets: Vec<Result<usize, String>> = vars
            .iter()
            .map(|&v| match net.var_states()[v] {
                2 => Ok(v),
                states => Err(non_binary_target(&names[v], states).to_string()),
            })
            .collect();

        let n = vars.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|row| (0..n).filter(move |&col| col != row).map(move |col| (row, col)))
            .collect();

        let span = info_span!("score_matrix", nodes = n, mode = %score_config.mode);
        let score_cell = |&(row, col): &(usize, usize)| {
            span.in_scope(|| {
                let score = match &targets[col] {
                    Ok(target) => self.scorer.score_resolved(vars[row], *target, &score_config),
                    Err(reason) => Score::undefined(reason.clone()),
                };
                MatrixEntry {
                    source: names[vars[row]].clone(),
                    target: names[vars[col]].clone(),
                    score,
                }
            })
        };

        let entries: Vec<MatrixEntry> = if config.parallel {
            pairs.par_iter().map(score_cell).collect()
        } else {
            pairs.iter().map(score_cell).collect()
        };

        span.in_scope(|| debug!(cells = entries.len(), "built score matrix"));
        Ok(ScoreMatrix {
            mode: score_config.mode,
            nodes: vars.iter().map(|&v| names[v].clone()).collect(),
            entries,
        })
    }

    /// Score every directed edge `parent → child` of the network.
    ///
    /// Edges come in sorted index order. Edges into a non-binary child are
    /// undefined; an out-of-range positive state is an error.
    pub fn edge_scores(&self, config: &ScoreConfig) -> Result<Vec<MatrixEntry>, BibasError> {
        let net = self.scorer.network();
        let names = net.names();
        let edges = net.edges();
        if let Some(&(_, child)) = edges.first() {
            check_positive_state(&names[child], config.positive_state)?;
        }

        let entries = edges
            .into_iter()
            .map(|(parent, child)| {
                let score = match net.var_states()[child] {
                    2 => self.scorer.score_resolved(parent, child, config),
                    states => {
                        Score::undefined(non_binary_target(&names[child], states).to_string())
                    }
                };
                MatrixEntry {
                    source: names[parent].clone(),
                    target: names[child].clone(),
                    score,
                }
            })
            .collect();
        Ok(entries)
    }
}

fn resolve_nodes(net: &BayesNet, names: &[&str]) -> Result<Vec<usize>, BibasError> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|&name| {
            let var = net
                .index_of(name)
                .ok_or_else(|| BibasError::UnknownNode(name.to_string()))?;
            if !seen.insert(var) {
                return Err(BibasError::DuplicateNode(name.to_string()));
            }
            Ok(var)
        })
        .collect()
}

fn default_nodes(net: &BayesNet, order: NodeOrder) -> Vec<usize> {
    let mut vars: Vec<usize> = (0..net.n_vars()).collect();
    if order == NodeOrder::Sorted {
        vars.sort_by(|&a, &b| net.names()[a].cmp(&net.names()[b]));
    }
    vars
}

/// Build the score matrix of `net` with variable elimination.
pub fn score_matrix(
    net: &BayesNet,
    nodes: Option<&[&str]>,
    config: &MatrixConfig,
) -> Result<ScoreMatrix, BibasError> {
    let engine = VariableElimination::new(net);
    MatrixBuilder::new(&engine).build(nodes, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibas_prob::{sprinkler_network, Dist, Evidence, Kernel, ProbError};

    fn with_ternary() -> BayesNet {
        let mut net = BayesNet::with_variables(&[("A", 2), ("C", 3), ("B", 2)]).unwrap();
        net.add_prior(0, &Dist::new(vec![0.4, 0.6]).unwrap()).unwrap();
        net.add_conditional(
            1,
            vec![0],
            Kernel::new(vec![vec![0.6, 0.3, 0.1], vec![0.1, 0.3, 0.6]]).unwrap(),
        )
        .unwrap();
        net.add_conditional(
            2,
            vec![1],
            Kernel::new(vec![vec![0.9, 0.1], vec![0.5, 0.5], vec![0.2, 0.8]]).unwrap(),
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
    fn test_cell_count_and_order() {
        let net = sprinkler_network();
        let matrix = score_matrix(&net, None, &MatrixConfig::default()).unwrap();
        assert_eq!(matrix.len(), 4 * 3);
        assert_eq!(matrix.nodes(), &["Cloudy", "Rain", "Sprinkler", "WetGrass"]);

        let first: Vec<(&str, &str)> = matrix
            .iter()
            .take(3)
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(
            first,
            vec![("Cloudy", "Rain"), ("Cloudy", "Sprinkler"), ("Cloudy", "WetGrass")]
        );
        assert!(matrix.iter().all(|e| e.source != e.target));
    }

    #[test]
    fn test_network_order() {
        let net = sprinkler_network();
        let mut config = MatrixConfig::default();
        config.order = NodeOrder::Network;
        let matrix = score_matrix(&net, None, &config).unwrap();
        assert_eq!(matrix.nodes(), net.names());
    }

    #[test]
    fn test_get_matches_pairwise() {
        let net = sprinkler_network();
        let config = MatrixConfig::new(Mode::Intervene);
        let matrix = score_matrix(&net, None, &config).unwrap();

        for source in net.names() {
            for target in net.names() {
                let cell = matrix.get(source, target);
                if source == target {
                    assert!(cell.is_none());
                    continue;
                }
                let direct = crate::bibas_score(&net, source, target, &config.score).unwrap();
                let (a, b) = (cell.unwrap().value().unwrap(), direct.value().unwrap());
                assert!((a - b).abs() < 1e-12, "{source} -> {target}");
            }
        }
    }

    #[test]
    fn test_grid_masks_diagonal() {
        let net = sprinkler_network();
        let grid = score_matrix(&net, None, &MatrixConfig::default()).unwrap().grid();
        assert_eq!(grid.len(), 4);
        for (i, row) in grid.iter().enumerate() {
            assert_eq!(row.len(), 4);
            for (j, cell) in row.iter().enumerate() {
                assert_eq!(cell.is_none(), i == j);
            }
        }
    }

    #[test]
    fn test_explicit_nodes() {
        let net = sprinkler_network();
        let config = MatrixConfig::default();
        let matrix = score_matrix(&net, Some(&["WetGrass", "Cloudy"]), &config).unwrap();
        assert_eq!(matrix.nodes(), &["WetGrass", "Cloudy"]);
        assert_eq!(matrix.len(), 2);
        assert!(matrix.get("Rain", "Cloudy").is_none());

        assert_eq!(
            score_matrix(&net, Some(&["Cloudy", "Fog"]), &MatrixConfig::default()).unwrap_err(),
            BibasError::UnknownNode("Fog".into())
        );
        assert_eq!(
            score_matrix(&net, Some(&["Rain", "Rain"]), &MatrixConfig::default()).unwrap_err(),
            BibasError::DuplicateNode("Rain".into())
        );
    }

    #[test]
    fn test_single_node_matrix_is_empty() {
        let net = sprinkler_network();
        let matrix = score_matrix(&net, Some(&["Rain"]), &MatrixConfig::default()).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.grid(), vec![vec![None]]);
    }

    #[test]
    fn test_strict_rejects_non_binary() {
        let net = with_ternary();
        assert_eq!(
            score_matrix(&net, None, &MatrixConfig::default()).unwrap_err(),
            BibasError::NonBinaryNetwork { nodes: vec!["C".into()] }
        );
    }

    #[test]
    fn test_lenient_marks_non_binary_targets() {
        let net = with_ternary();
        let matrix = score_matrix(&net, None, &MatrixConfig::default().lenient()).unwrap();
        assert_eq!(matrix.len(), 6);

        for entry in matrix.iter() {
            assert_eq!(entry.score.is_defined(), entry.target != "C", "{entry:?}");
        }
        // A non-binary source is fine.
        assert!(matrix.get("C", "B").unwrap().value().unwrap() > 0.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let net = sprinkler_network();
        let mut config = MatrixConfig::default();
        let parallel = score_matrix(&net, None, &config).unwrap();
        config.parallel = false;
        assert_eq!(parallel, score_matrix(&net, None, &config).unwrap());
    }

    #[test]
    fn test_edge_scores() {
        let net = with_ternary();
        let engine = VariableElimination::new(&net);
        let edges = MatrixBuilder::new(&engine)
            .edge_scores(&ScoreConfig::default())
            .unwrap();

        let pairs: Vec<(&str, &str, bool)> = edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str(), e.score.is_defined()))
            .collect();
        assert_eq!(pairs, vec![("A", "C", false), ("C", "B", true)]);
    }

    #[test]
    fn test_positive_state_out_of_range_fails_fast() {
        let net = sprinkler_network();
        let mut config = MatrixConfig::default().lenient();
        config.score.positive_state = 7;
        assert!(matches!(
            score_matrix(&net, None, &config),
            Err(BibasError::InvalidTarget { reason, .. }) if reason.contains("out of range")
        ));

        // Also on a network whose non-binary columns lenient mode would absorb.
        let ternary = with_ternary();
        assert!(matches!(
            score_matrix(&ternary, None, &config),
            Err(BibasError::InvalidTarget { .. })
        ));

        let engine = VariableElimination::new(&ternary);
        assert!(matches!(
            MatrixBuilder::new(&engine).edge_scores(&config.score),
            Err(BibasError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_failing_source_row_is_undefined() {
        let net = sprinkler_network();
        let cloudy = net.index_of("Cloudy").unwrap();
        let engine = BrokenSourceEngine {
            inner: VariableElimination::new(&net),
            broken: cloudy,
        };

        for parallel in [true, false] {
            let mut config = MatrixConfig::new(Mode::Intervene);
            config.parallel = parallel;
            let matrix = MatrixBuilder::new(&engine).build(None, &config).unwrap();
            assert_eq!(matrix.len(), 12);

            for entry in matrix.iter() {
                assert_eq!(entry.score.is_defined(), entry.source != "Cloudy", "{entry:?}");
            }
            let undefined = matrix.iter().filter(|e| !e.score.is_defined()).count();
            assert_eq!(undefined, 3);
            assert_eq!(matrix.grid()[0], vec![None, None, None, None]);
        }
    }
}
