//! Probability distributions over finite sets.

use crate::error::ProbError;
use crate::PROB_TOLERANCE;

/// A probability distribution over a finite set {0, 1, ..., n-1}.
///
/// Invariants:
/// - All probabilities are non-negative
/// - Probabilities sum to 1 (within tolerance)
///
/// # Example
///
/// ```rust
/// use bibas_prob::Dist;
///
/// let coin = Dist::uniform(2);
/// assert!((coin.p[0] - 0.5).abs() < 1e-12);
///
/// let certain = Dist::point(3, 1);
/// assert_eq!(certain.p[1], 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dist {
    /// Probability vector (sums to 1).
    pub p: Vec<f64>,
}

impl Dist {
    /// A distribution from a probability vector that already sums to 1.
    ///
    /// Fails on an empty vector, a negative entry, or a sum off by more than
    /// [`PROB_TOLERANCE`].
    pub fn new(p: Vec<f64>) -> Result<Self, ProbError> {
        let sum = checked_sum(&p, -PROB_TOLERANCE)?;
        if (sum - 1.0).abs() > PROB_TOLERANCE {
            return Err(ProbError::NotNormalized { sum });
        }
        Ok(Self { p })
    }

    /// Normalize unnormalized weights, e.g. a factor reduced by evidence.
    ///
    /// ```rust
    /// use bibas_prob::Dist;
    ///
    /// let d = Dist::from_weights(vec![1.0, 3.0]).unwrap();
    /// assert!((d.p[1] - 0.75).abs() < 1e-12);
    /// ```
    pub fn from_weights(mut weights: Vec<f64>) -> Result<Self, ProbError> {
        let sum = checked_sum(&weights, 0.0)?;
        if sum <= 0.0 {
            return Err(ProbError::ZeroWeights);
        }
        weights.iter_mut().for_each(|w| *w /= sum);
        Ok(Self { p: weights })
    }

    /// Uniform over `n` states. Panics if `n == 0`.
    pub fn uniform(n: usize) -> Self {
        assert!(n > 0, "Cannot create uniform distribution over empty set");
        Self {
            p: vec![1.0 / n as f64; n],
        }
    }

    /// All mass on state `i`, as used for `do(X = i)`. Panics if `i >= n`.
    pub fn point(n: usize, i: usize) -> Self {
        assert!(i < n, "Index {} out of bounds for size {}", i, n);
        let mut p = vec![0.0; n];
        p[i] = 1.0;
        Self { p }
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.p.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    /// Probability of state `i`.
    pub fn prob(&self, i: usize) -> Result<f64, ProbError> {
        self.p
            .get(i)
            .copied()
            .ok_or(ProbError::IndexOutOfBounds {
                index: i,
                size: self.p.len(),
            })
    }
}

/// Sum of `values`, rejecting an empty slice, a non-finite entry or any
/// entry below `floor`.
fn checked_sum(values: &[f64], floor: f64) -> Result<f64, ProbError> {
    if values.is_empty() {
        return Err(ProbError::EmptyDistribution);
    }
    if values.iter().any(|x| !x.is_finite()) {
        return Err(ProbError::NonFiniteProbability);
    }
    if values.iter().any(|&x| x < floor) {
        return Err(ProbError::NegativeProbability);
    }
    Ok(values.iter().sum())
}
