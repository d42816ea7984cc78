//! Markov kernels (row-stochastic matrices) used as conditional probability tables.

use crate::dist::Dist;
use crate::error::ProbError;
use crate::PROB_TOLERANCE;

/// A Markov kernel from a finite set of parent configurations to a
/// finite set of child states.
///
/// Represented as a row-stochastic matrix where:
/// - `k[i][j]` = P(child = j | parent configuration = i)
/// - Each row sums to 1
///
/// # Example
///
/// ```rust
/// use bibas_prob::Kernel;
///
/// let channel = Kernel::new(vec![
///     vec![0.9, 0.1],
///     vec![0.1, 0.9],
/// ]).unwrap();
/// assert_eq!(channel.n_inputs, 2);
/// assert_eq!(channel.row(1), Some(&[0.1, 0.9][..]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    /// Row-stochastic matrix: `k[i][j]` = P(output=j | input=i)
    pub k: Vec<Vec<f64>>,
    /// Number of input states (parent configurations)
    pub n_inputs: usize,
    /// Number of output states
    pub n_outputs: usize,
}

impl Kernel {
    /// Create a new kernel from a row-stochastic matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The matrix is empty
    /// - Rows have different lengths
    /// - Any entry is NaN, infinite or negative
    /// - Any row doesn't sum to 1 (within tolerance)
    pub fn new(k: Vec<Vec<f64>>) -> Result<Self, ProbError> {
        let n_inputs = k.len();
        let n_outputs = match k.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => return Err(ProbError::EmptyKernel),
        };

        for (i, row) in k.iter().enumerate() {
            if row.len() != n_outputs {
                return Err(ProbError::RaggedMatrix);
            }

            if row.iter().any(|x| !x.is_finite()) {
                return Err(ProbError::NonFiniteProbability);
            }

            if row.iter().any(|&x| x < -PROB_TOLERANCE) {
                return Err(ProbError::NegativeProbability);
            }

            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > PROB_TOLERANCE {
                return Err(ProbError::RowNotNormalized { row: i, sum });
            }
        }

        Ok(Self {
            k,
            n_inputs,
            n_outputs,
        })
    }

    /// Create a constant kernel: every input yields the same distribution.
    pub fn constant(n_inputs: usize, dist: &Dist) -> Self {
        let k: Vec<Vec<f64>> = (0..n_inputs).map(|_| dist.p.clone()).collect();
        Self {
            k,
            n_inputs,
            n_outputs: dist.p.len(),
        }
    }

    /// The output distribution for input `i`, if it exists.
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        self.k.get(i).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_new_valid() {
        let k = Kernel::new(vec![vec![0.2, 0.8], vec![0.6, 0.4], vec![1.0, 0.0]]).unwrap();
        assert_eq!(k.n_inputs, 3);
        assert_eq!(k.n_outputs, 2);
    }

    #[test]
    fn test_kernel_empty() {
        assert_eq!(Kernel::new(vec![]), Err(ProbError::EmptyKernel));
        assert_eq!(Kernel::new(vec![vec![]]), Err(ProbError::EmptyKernel));
    }

    #[test]
    fn test_kernel_ragged() {
        let result = Kernel::new(vec![vec![0.5, 0.5], vec![1.0]]);
        assert_eq!(result, Err(ProbError::RaggedMatrix));
    }

    #[test]
    fn test_kernel_rejects_nan() {
        let result = Kernel::new(vec![vec![f64::NAN, 0.5], vec![0.5, 0.5]]);
        assert_eq!(result, Err(ProbError::NonFiniteProbability));

        let result = Kernel::new(vec![vec![0.5, 0.5], vec![f64::NEG_INFINITY, 1.0]]);
        assert_eq!(result, Err(ProbError::NonFiniteProbability));
    }

    #[test]
    fn test_kernel_row_not_normalized() {
        let result = Kernel::new(vec![vec![0.5, 0.5], vec![0.5, 0.4]]);
        assert!(matches!(
            result,
            Err(ProbError::RowNotNormalized { row: 1, .. })
        ));
    }

    #[test]
    fn test_kernel_constant() {
        let d = Dist::new(vec![0.25, 0.75]).unwrap();
        let k = Kernel::constant(3, &d);
        assert_eq!(k.n_inputs, 3);
        assert_eq!(k.row(2), Some(&[0.25, 0.75][..]));
        assert_eq!(k.row(3), None);
    }
}
