//! Discrete Bayesian networks.
//!
//! A Bayesian network is a directed acyclic graph where:
//! - Nodes are discrete random variables with a fixed number of states
//! - Edges point from each parent to its child
//! - Each node carries a conditional probability table given its parents
//!
//! The structure lives in a `petgraph` graph whose node `i` is variable `i`,
//! so structural queries (parents, ancestors, blankets) never touch the CPTs.

use crate::dist::Dist;
use crate::error::ProbError;
use crate::kernel::Kernel;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// An assignment of states to variables, keyed by variable index.
///
/// Used both for observational evidence and for do-interventions.
pub type Evidence = HashMap<usize, usize>;

/// A conditional probability distribution P(variable | parents).
#[derive(Debug, Clone, PartialEq)]
pub struct Cpd {
    /// The variable this CPD defines.
    pub variable: usize,
    /// Parent variables, in the order used to encode table rows.
    pub parents: Vec<usize>,
    /// Number of states for this variable.
    pub n_states: usize,
    /// Number of states for each parent.
    pub parent_states: Vec<usize>,
    /// The conditional probability table.
    /// Indexed by (parent_config, variable_state), where parent_config is the
    /// row-major encoding of the parent states (first parent most significant).
    pub cpt: Kernel,
}

impl Cpd {
    /// Create a new CPD P(variable | parents).
    ///
    /// The CPT must have one row per parent configuration
    /// and one column per state of the variable.
    pub fn new(
        variable: usize,
        parents: Vec<usize>,
        n_states: usize,
        parent_states: Vec<usize>,
        cpt: Kernel,
    ) -> Result<Self, ProbError> {
        if parents.len() != parent_states.len() {
            return Err(ProbError::ShapeMismatch {
                expected: parents.len(),
                got: parent_states.len(),
            });
        }

        let n_parent_configs: usize = parent_states.iter().product();

        if cpt.n_inputs != n_parent_configs {
            return Err(ProbError::ShapeMismatch {
                expected: n_parent_configs,
                got: cpt.n_inputs,
            });
        }

        if cpt.n_outputs != n_states {
            return Err(ProbError::ShapeMismatch {
                expected: n_states,
                got: cpt.n_outputs,
            });
        }

        Ok(Self {
            variable,
            parents,
            n_states,
            parent_states,
            cpt,
        })
    }

    /// Create a prior CPD (no parents).
    pub fn prior(variable: usize, dist: &Dist) -> Self {
        Self {
            variable,
            parents: vec![],
            n_states: dist.len(),
            parent_states: vec![],
            cpt: Kernel::constant(1, dist),
        }
    }

    /// Encode parent states into a single row index (row-major order).
    ///
    /// For parents with states [s0, s1], values [v0, v1] encodes as:
    /// idx = v0 * s1 + v1
    pub fn encode_parents(&self, parent_values: &[usize]) -> usize {
        parent_values
            .iter()
            .zip(&self.parent_states)
            .fold(0, |idx, (&val, &states)| idx * states + val)
    }

    /// P(variable = state | parent_values); 0 for an out-of-range lookup.
    pub fn prob(&self, state: usize, parent_values: &[usize]) -> f64 {
        self.cpt
            .row(self.encode_parents(parent_values))
            .and_then(|row| row.get(state))
            .copied()
            .unwrap_or(0.0)
    }
}

/// A discrete Bayesian network.
///
/// Variables are declared first with [`BayesNet::add_variable`]; each then
/// receives exactly one CPD via [`BayesNet::add_prior`] or
/// [`BayesNet::add_conditional`]. Edges that would close a cycle are rejected
/// when the CPD is attached, so the graph is acyclic at all times.
///
/// # Example
///
/// ```rust
/// use bibas_prob::{BayesNet, Dist, Kernel};
///
/// let mut net = BayesNet::new();
/// let a = net.add_variable("A", 2).unwrap();
/// let b = net.add_variable("B", 2).unwrap();
/// net.add_prior(a, &Dist::new(vec![0.5, 0.5]).unwrap()).unwrap();
/// net.add_conditional(b, vec![a], Kernel::new(vec![
///     vec![0.9, 0.1],
///     vec![0.1, 0.9],
/// ]).unwrap()).unwrap();
///
/// assert!(net.validate().is_ok());
/// assert!(net.is_parent(a, b));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BayesNet {
    var_states: Vec<usize>,
    var_names: Vec<String>,
    name_index: HashMap<String, usize>,
    cpds: Vec<Option<Cpd>>,
    graph: DiGraph<usize, ()>,
}

impl BayesNet {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a network with the given `(name, states)` variables and no CPDs yet.
    pub fn with_variables(variables: &[(&str, usize)]) -> Result<Self, ProbError> {
        let mut net = Self::new();
        for &(name, states) in variables {
            net.add_variable(name, states)?;
        }
        Ok(net)
    }

    /// Declare a variable and return its index.
    pub fn add_variable(&mut self, name: &str, n_states: usize) -> Result<usize, ProbError> {
        if self.name_index.contains_key(name) {
            return Err(ProbError::DuplicateVariable(name.to_string()));
        }
        if n_states < 2 {
            return Err(ProbError::InvalidCardinality {
                variable: name.to_string(),
                states: n_states,
            });
        }

        let index = self.var_states.len();
        self.var_states.push(n_states);
        self.var_names.push(name.to_string());
        self.name_index.insert(name.to_string(), index);
        self.cpds.push(None);
        self.graph.add_node(index);
        Ok(index)
    }

    /// Number of variables in the network.
    pub fn n_vars(&self) -> usize {
        self.var_states.len()
    }

    /// Number of states for each variable, in declaration order.
    pub fn var_states(&self) -> &[usize] {
        &self.var_states
    }

    /// Variable names, in declaration order.
    pub fn names(&self) -> &[String] {
        &self.var_names
    }

    /// Name of a variable.
    pub fn name(&self, var: usize) -> Option<&str> {
        self.var_names.get(var).map(String::as_str)
    }

    /// Index of the variable with this name, if declared.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// Index of the variable with this name.
    pub fn variable(&self, name: &str) -> Result<usize, ProbError> {
        self.index_of(name)
            .ok_or_else(|| ProbError::UnknownVariable(name.to_string()))
    }

    /// Number of states of a variable.
    pub fn cardinality(&self, var: usize) -> Result<usize, ProbError> {
        self.var_states
            .get(var)
            .copied()
            .ok_or(ProbError::IndexOutOfBounds {
                index: var,
                size: self.n_vars(),
            })
    }

    /// Check that `state` is a valid state of `var`.
    pub fn check_state(&self, var: usize, state: usize) -> Result<(), ProbError> {
        let states = self.cardinality(var)?;
        if state >= states {
            return Err(ProbError::StateOutOfRange {
                variable: self.var_names[var].clone(),
                state,
                states,
            });
        }
        Ok(())
    }

    /// Check every variable and state of an evidence assignment.
    pub fn check_evidence(&self, evidence: &Evidence) -> Result<(), ProbError> {
        evidence
            .iter()
            .try_for_each(|(&var, &state)| self.check_state(var, state))
    }

    /// Add a prior (root node) to the network.
    pub fn add_prior(&mut self, variable: usize, dist: &Dist) -> Result<(), ProbError> {
        let states = self.cardinality(variable)?;
        if dist.len() != states {
            return Err(ProbError::ShapeMismatch {
                expected: states,
                got: dist.len(),
            });
        }
        self.attach(Cpd::prior(variable, dist))
    }

    /// Add a conditional P(child | parents) to the network.
    pub fn add_conditional(
        &mut self,
        child: usize,
        parents: Vec<usize>,
        cpt: Kernel,
    ) -> Result<(), ProbError> {
        let n_states = self.cardinality(child)?;
        let parent_states = parents
            .iter()
            .map(|&p| self.cardinality(p))
            .collect::<Result<Vec<_>, _>>()?;

        let cpd = Cpd::new(child, parents, n_states, parent_states, cpt)?;
        self.attach(cpd)
    }

    fn attach(&mut self, cpd: Cpd) -> Result<(), ProbError> {
        let child = cpd.variable;
        if self.cpds[child].is_some() {
            return Err(ProbError::DuplicateCpd(self.var_names[child].clone()));
        }

        for (i, &parent) in cpd.parents.iter().enumerate() {
            if cpd.parents[..i].contains(&parent) {
                return Err(ProbError::DuplicateParent {
                    child: self.var_names[child].clone(),
                    parent: self.var_names[parent].clone(),
                });
            }
            if parent == child
                || has_path_connecting(&self.graph, node(child), node(parent), None)
            {
                return Err(ProbError::Cycle {
                    parent: self.var_names[parent].clone(),
                    child: self.var_names[child].clone(),
                });
            }
        }

        for &parent in &cpd.parents {
            self.graph.add_edge(node(parent), node(child), ());
        }
        self.cpds[child] = Some(cpd);
        Ok(())
    }

    /// The CPD of a variable.
    pub fn cpd(&self, var: usize) -> Result<&Cpd, ProbError> {
        match self.cpds.get(var) {
            Some(Some(cpd)) => Ok(cpd),
            Some(None) => Err(ProbError::MissingCpd(self.var_names[var].clone())),
            None => Err(ProbError::IndexOutOfBounds {
                index: var,
                size: self.n_vars(),
            }),
        }
    }

    /// Replace a variable's CPD, rewiring its incoming edges.
    ///
    /// Only used for graph surgery, where the new CPD has no parents.
    pub(crate) fn replace_with_prior(&mut self, var: usize, dist: &Dist) {
        let target = node(var);
        self.graph
            .retain_edges(|g, e| g.edge_endpoints(e).map_or(true, |(_, head)| head != target));
        self.cpds[var] = Some(Cpd::prior(var, dist));
    }

    /// Check that every variable has a CPD.
    pub fn validate(&self) -> Result<(), ProbError> {
        (0..self.n_vars()).try_for_each(|var| self.cpd(var).map(|_| ()))
    }

    /// Parents of a variable, in ascending index order.
    pub fn parents(&self, var: usize) -> Vec<usize> {
        self.neighbors(var, Direction::Incoming)
    }

    /// Children of a variable, in ascending index order.
    pub fn children(&self, var: usize) -> Vec<usize> {
        self.neighbors(var, Direction::Outgoing)
    }

    fn neighbors(&self, var: usize, direction: Direction) -> Vec<usize> {
        if var >= self.n_vars() {
            return Vec::new();
        }
        let mut out: Vec<usize> = self
            .graph
            .neighbors_directed(node(var), direction)
            .map(NodeIndex::index)
            .collect();
        out.sort_unstable();
        out
    }

    /// True when there is an edge `parent -> child`.
    pub fn is_parent(&self, parent: usize, child: usize) -> bool {
        parent < self.n_vars()
            && child < self.n_vars()
            && self.graph.find_edge(node(parent), node(child)).is_some()
    }

    /// All edges `(parent, child)`, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(from, to)| (from.index(), to.index()))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Mask of the given variables together with all of their ancestors.
    pub fn ancestors(&self, vars: &[usize]) -> Vec<bool> {
        let mut seen = vec![false; self.n_vars()];
        let mut stack: Vec<usize> = vars.iter().copied().filter(|&v| v < seen.len()).collect();
        while let Some(var) = stack.pop() {
            if seen[var] {
                continue;
            }
            seen[var] = true;
            stack.extend(self.parents(var).into_iter().filter(|&p| !seen[p]));
        }
        seen
    }

    /// The Markov blanket of a variable: its parents, its children and the
    /// children's other parents. The variable itself is excluded.
    pub fn markov_blanket(&self, var: usize) -> Vec<usize> {
        let mut blanket = self.parents(var);
        for child in self.children(var) {
            blanket.push(child);
            blanket.extend(self.parents(child));
        }
        blanket.retain(|&v| v != var);
        blanket.sort_unstable();
        blanket.dedup();
        blanket
    }

    /// Compute the joint probability P(X₁=x₁, ..., Xₙ=xₙ).
    pub fn joint_prob(&self, assignment: &[usize]) -> Result<f64, ProbError> {
        if assignment.len() != self.n_vars() {
            return Err(ProbError::ShapeMismatch {
                expected: self.n_vars(),
                got: assignment.len(),
            });
        }

        let mut prob = 1.0;
        for var in 0..self.n_vars() {
            let cpd = self.cpd(var)?;
            let parent_values: Vec<usize> = cpd.parents.iter().map(|&p| assignment[p]).collect();
            prob *= cpd.prob(assignment[var], &parent_values);
        }
        Ok(prob)
    }

    /// Compute the full joint distribution as a flattened vector.
    ///
    /// The index encodes the assignment: idx = x₀ + x₁*s₀ + x₂*s₀*s₁ + ...
    /// Exponential in the number of variables; intended for small networks.
    pub fn full_joint(&self) -> Result<JointDist, ProbError> {
        self.validate()?;
        let total_states: usize = self.var_states.iter().product();
        let joint = JointDist {
            var_states: self.var_states.clone(),
            probs: vec![0.0; total_states],
        };

        let probs = (0..total_states)
            .map(|idx| self.joint_prob(&joint.decode(idx)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(JointDist { probs, ..joint })
    }
}

fn node(var: usize) -> NodeIndex {
    NodeIndex::new(var)
}

/// A joint distribution over multiple variables.
#[derive(Debug, Clone, PartialEq)]
pub struct JointDist {
    /// Number of states for each variable.
    pub var_states: Vec<usize>,
    /// Flattened probability vector.
    pub probs: Vec<f64>,
}

impl JointDist {
    /// Get the number of variables.
    pub fn n_vars(&self) -> usize {
        self.var_states.len()
    }

    /// Encode an assignment into an index.
    pub fn encode(&self, assignment: &[usize]) -> usize {
        let mut idx = 0;
        let mut multiplier = 1;
        for (i, &val) in assignment.iter().enumerate() {
            idx += val * multiplier;
            multiplier *= self.var_states[i];
        }
        idx
    }

    /// Decode an index into an assignment.
    pub fn decode(&self, mut idx: usize) -> Vec<usize> {
        let mut assignment = vec![0; self.var_states.len()];
        for (i, val) in assignment.iter_mut().enumerate() {
            *val = idx % self.var_states[i];
            idx /= self.var_states[i];
        }
        assignment
    }

    /// Marginal distribution of a single variable.
    pub fn marginal(&self, var: usize) -> Result<Dist, ProbError> {
        self.condition_on(var, &Evidence::new())
    }

    /// Condition on evidence: P(query | evidence).
    pub fn condition_on(&self, query_var: usize, evidence: &Evidence) -> Result<Dist, ProbError> {
        let n_states = *self
            .var_states
            .get(query_var)
            .ok_or(ProbError::IndexOutOfBounds {
                index: query_var,
                size: self.n_vars(),
            })?;
        let mut unnormalized = vec![0.0; n_states];

        for (idx, &p) in self.probs.iter().enumerate() {
            let assignment = self.decode(idx);
            let matches = evidence
                .iter()
                .all(|(&var, &val)| assignment.get(var) == Some(&val));

            if matches {
                unnormalized[assignment[query_var]] += p;
            }
        }

        Dist::from_weights(unnormalized).map_err(|err| match err {
            ProbError::ZeroWeights => ProbError::ImpossibleEvidence,
            other => other,
        })
    }
}

/// Create a classic "sprinkler" Bayesian network.
///
/// Structure:
/// ```text
///      Cloudy (C)
///      ↙     ↘
/// Sprinkler   Rain
///     (S)      (R)
///        ↘    ↙
///       WetGrass (W)
/// ```
///
/// All variables are binary: 0 = false, 1 = true.
pub fn sprinkler_network() -> BayesNet {
    build_sprinkler().expect("sprinkler CPTs are well-formed")
}

fn build_sprinkler() -> Result<BayesNet, ProbError> {
    let mut net = BayesNet::with_variables(&[
        ("Cloudy", 2),
        ("Sprinkler", 2),
        ("Rain", 2),
        ("WetGrass", 2),
    ])?;

    net.add_prior(0, &Dist::new(vec![0.5, 0.5])?)?;

    // P(Sprinkler | Cloudy)
    net.add_conditional(1, vec![0], Kernel::new(vec![vec![0.5, 0.5], vec![0.9, 0.1]])?)?;

    // P(Rain | Cloudy)
    net.add_conditional(2, vec![0], Kernel::new(vec![vec![0.8, 0.2], vec![0.2, 0.8]])?)?;

    // P(WetGrass | Sprinkler, Rain), rows S*2 + R
    net.add_conditional(
        3,
        vec![1, 2],
        Kernel::new(vec![
            vec![1.0, 0.0],
            vec![0.2, 0.8],
            vec![0.1, 0.9],
            vec![0.01, 0.99],
        ])?,
    )?;

    Ok(net)
}
