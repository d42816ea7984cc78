//! Factor tables for sum-product variable elimination.
//!
//! A factor φ(X₁, ..., Xₖ) maps every joint assignment of its scope to a
//! non-negative number. Values are stored row-major: the last variable of the
//! scope varies fastest, matching the parent encoding of [`crate::Cpd`].

use crate::network::Cpd;

/// A non-negative table over a set of discrete variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    /// Variables in scope, by network index.
    pub vars: Vec<usize>,
    /// Number of states of each variable in scope.
    pub cards: Vec<usize>,
    /// Table values, row-major over `vars`.
    pub values: Vec<f64>,
}

impl Factor {
    /// The multiplicative identity: empty scope, single value 1.
    pub fn unit() -> Self {
        Self {
            vars: Vec::new(),
            cards: Vec::new(),
            values: vec![1.0],
        }
    }

    /// View a CPD P(X | parents) as a factor over (parents..., X).
    pub fn from_cpd(cpd: &Cpd) -> Self {
        let mut vars = cpd.parents.clone();
        vars.push(cpd.variable);
        let mut cards = cpd.parent_states.clone();
        cards.push(cpd.n_states);
        let values = cpd.cpt.k.iter().flatten().copied().collect();
        Self {
            vars,
            cards,
            values,
        }
    }

    /// Whether `var` is in scope.
    pub fn contains(&self, var: usize) -> bool {
        self.vars.contains(&var)
    }

    /// Number of entries in the table.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Pointwise product over the union of both scopes.
    ///
    /// The result scope is `self.vars` followed by the variables of `other`
    /// that `self` does not mention.
    pub fn product(&self, other: &Factor) -> Factor {
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        let mut other_pos = Vec::with_capacity(other.vars.len());
        for (&v, &c) in other.vars.iter().zip(&other.cards) {
            match vars.iter().position(|&x| x == v) {
                Some(pos) => other_pos.push(pos),
                None => {
                    other_pos.push(vars.len());
                    vars.push(v);
                    cards.push(c);
                }
            }
        }

        let self_strides = strides(&self.cards);
        let other_strides = strides(&other.cards);
        let size: usize = cards.iter().product();
        let mut values = Vec::with_capacity(size);
        let mut assignment = vec![0; vars.len()];

        for _ in 0..size {
            let a: usize = self_strides
                .iter()
                .enumerate()
                .map(|(i, s)| assignment[i] * s)
                .sum();
            let b: usize = other_pos
                .iter()
                .zip(&other_strides)
                .map(|(&pos, s)| assignment[pos] * s)
                .sum();
            values.push(self.values[a] * other.values[b]);
            advance(&mut assignment, &cards);
        }

        Factor {
            vars,
            cards,
            values,
        }
    }

    /// Sum `var` out of the factor. A no-op when `var` is not in scope.
    pub fn sum_out(&self, var: usize) -> Factor {
        self.collapse(var, None)
    }

    /// Restrict the factor to `var = state`, dropping `var` from scope.
    pub fn reduce(&self, var: usize, state: usize) -> Factor {
        self.collapse(var, Some(state))
    }

    fn collapse(&self, var: usize, keep_state: Option<usize>) -> Factor {
        let Some(pos) = self.vars.iter().position(|&v| v == var) else {
            return self.clone();
        };

        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(pos);
        cards.remove(pos);

        let out_strides = strides(&cards);
        let mut values = vec![0.0; cards.iter().product()];
        let mut assignment = vec![0; self.vars.len()];

        for &value in &self.values {
            if keep_state.map_or(true, |s| assignment[pos] == s) {
                let idx: usize = assignment
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != pos)
                    .zip(&out_strides)
                    .map(|((_, a), s)| a * s)
                    .sum();
                values[idx] += value;
            }
            advance(&mut assignment, &self.cards);
        }

        Factor {
            vars,
            cards,
            values,
        }
    }
}

/// Row-major strides: the last variable has stride 1.
fn strides(cards: &[usize]) -> Vec<usize> {
    let mut out = vec![1; cards.len()];
    for i in (0..cards.len().saturating_sub(1)).rev() {
        out[i] = out[i + 1] * cards[i + 1];
    }
    out
}

/// Step to the next assignment in row-major order.
fn advance(assignment: &mut [usize], cards: &[usize]) {
    for i in (0..assignment.len()).rev() {
        assignment[i] += 1;
        if assignment[i] < cards[i] {
            return;
        }
        assignment[i] = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Kernel, PROB_TOLERANCE};

    fn approx(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < PROB_TOLERANCE)
    }

    fn phi_ab() -> Factor {
        Factor {
            vars: vec![0, 1],
            cards: vec![2, 3],
            values: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        }
    }

    #[test]
    fn test_strides() {
        assert_eq!(strides(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(strides(&[]), Vec::<usize>::new());
    }

    #[test]
    fn test_from_cpd_layout() {
        let cpt = Kernel::new(vec![vec![0.9, 0.1], vec![0.2, 0.8]]).unwrap();
        let cpd = Cpd::new(1, vec![0], 2, vec![2], cpt).unwrap();
        let f = Factor::from_cpd(&cpd);
        assert_eq!(f.vars, vec![0, 1]);
        assert!(approx(&f.values, &[0.9, 0.1, 0.2, 0.8]));
    }

    #[test]
    fn test_sum_out() {
        let f = phi_ab();
        let over_b = f.sum_out(0);
        assert_eq!(over_b.vars, vec![1]);
        assert!(approx(&over_b.values, &[5.0, 7.0, 9.0]));

        let over_a = f.sum_out(1);
        assert_eq!(over_a.vars, vec![0]);
        assert!(approx(&over_a.values, &[6.0, 15.0]));

        assert_eq!(f.sum_out(7), f);
    }

    #[test]
    fn test_reduce() {
        let f = phi_ab();
        let a1 = f.reduce(0, 1);
        assert_eq!(a1.vars, vec![1]);
        assert!(approx(&a1.values, &[4.0, 5.0, 6.0]));

        let b2 = f.reduce(1, 2);
        assert_eq!(b2.vars, vec![0]);
        assert!(approx(&b2.values, &[3.0, 6.0]));
    }

    #[test]
    fn test_product_shared_variable() {
        // φ(A,B) · ψ(B)
        let psi = Factor {
            vars: vec![1],
            cards: vec![3],
            values: vec![10.0, 0.0, 1.0],
        };
        let prod = phi_ab().product(&psi);
        assert_eq!(prod.vars, vec![0, 1]);
        assert!(approx(&prod.values, &[10.0, 0.0, 3.0, 40.0, 0.0, 6.0]));
    }

    #[test]
    fn test_product_disjoint_scopes() {
        let a = Factor {
            vars: vec![0],
            cards: vec![2],
            values: vec![0.25, 0.75],
        };
        let c = Factor {
            vars: vec![2],
            cards: vec![2],
            values: vec![0.5, 2.0],
        };
        let prod = a.product(&c);
        assert_eq!(prod.vars, vec![0, 2]);
        assert!(approx(&prod.values, &[0.125, 0.5, 0.375, 1.5]));
        assert_eq!(Factor::unit().product(&a), a);
    }
}
