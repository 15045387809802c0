use log::trace;
use rand::Rng;

use crate::matrix::{cast, Scalar};
use crate::random::standard_normal_pair;

/// Power iterations for the dominant eigenpair of a small symmetric matrix.
///
/// Applied to a covariance matrix this yields the first principal component,
/// which is how the PCA partitioning initializer picks its split axis.
#[derive(Debug, Clone)]
pub struct PowerIterations {
    /// Maximum number of matrix-vector products.
    pub iterations: usize,
    /// Convergence threshold on the L2 norm of the change between successive
    /// normalized iterates.
    pub tolerance: f64,
}

impl Default for PowerIterations {
    fn default() -> Self {
        Self {
            iterations: 500,
            tolerance: 1e-6,
        }
    }
}

/// Outcome of [`PowerIterations::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerResult<T> {
    /// Estimate of the dominant eigenvalue.
    pub eigenvalue: T,
    /// Number of iterations needed to converge, `None` if the budget ran out.
    pub iterations: Option<usize>,
}

impl PowerIterations {
    pub fn new(iterations: usize, tolerance: f64) -> Self {
        Self {
            iterations,
            tolerance,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Estimates the dominant eigenvector of the `order`-by-`order` symmetric
    /// column-major `matrix`, writing it into `output`.
    ///
    /// `output` starts from a random unit vector drawn from `rng`.
    pub fn run<T: Scalar, R: Rng + ?Sized>(
        &self,
        order: usize,
        matrix: &[T],
        output: &mut [T],
        rng: &mut R,
    ) -> PowerResult<T> {
        if order == 0 {
            return PowerResult {
                eigenvalue: T::zero(),
                iterations: Some(0),
            };
        }

        let output = &mut output[..order];
        loop {
            let mut d = 0;
            while d + 1 < order {
                let (first, second) = standard_normal_pair(rng);
                output[d] = cast(first);
                output[d + 1] = cast(second);
                d += 2;
            }
            if order % 2 == 1 {
                output[order - 1] = cast(standard_normal_pair(rng).0);
            }
            if normalize(output) != T::zero() {
                break;
            }
        }

        let tolerance: T = cast(self.tolerance);
        let mut result = PowerResult {
            eigenvalue: T::zero(),
            iterations: None,
        };
        let mut buffer = vec![T::zero(); order];

        for it in 0..self.iterations {
            // Symmetry lets each row product read a contiguous column.
            for (j, slot) in buffer.iter_mut().enumerate() {
                let col = &matrix[j * order..(j + 1) * order];
                *slot = col
                    .iter()
                    .zip(output.iter())
                    .fold(T::zero(), |acc, (&m, &v)| acc + m * v);
            }
            result.eigenvalue = normalize(&mut buffer);

            let err = buffer
                .iter()
                .zip(output.iter())
                .fold(T::zero(), |acc, (&b, &o)| acc + (b - o) * (b - o))
                .sqrt();
            if err < tolerance {
                result.iterations = Some(it + 1);
                trace!("power iterations converged after {} iterations", it + 1);
                break;
            }

            output.copy_from_slice(&buffer);
        }

        result
    }
}

/// Scales `x` to unit length in place and returns its original norm. A zero
/// vector is left untouched.
pub(crate) fn normalize<T: Scalar>(x: &mut [T]) -> T {
    let norm = x.iter().fold(T::zero(), |acc, &v| acc + v * v).sqrt();
    if norm != T::zero() {
        for v in x.iter_mut() {
            *v = *v / norm;
        }
    }
    norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::engine;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_diagonal_matrix() {
        let matrix = vec![1.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 2.0];
        let mut output = vec![0.0f64; 3];
        let res = PowerIterations::default().run(3, &matrix, &mut output, &mut engine(1));
        assert!(res.iterations.is_some());
        assert_abs_diff_eq!(res.eigenvalue, 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(output[1].abs(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(output[0], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_symmetric_matrix() {
        // Eigenvalues 3 and 1; dominant eigenvector (1, 1) / sqrt(2).
        let matrix = vec![2.0f64, 1.0, 1.0, 2.0];
        let mut output = vec![0.0; 2];
        let res = PowerIterations::default().run(2, &matrix, &mut output, &mut engine(5));
        assert_abs_diff_eq!(res.eigenvalue, 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(output[0].abs(), 0.5f64.sqrt(), epsilon = 1e-5);
        assert_abs_diff_eq!(output[0], output[1], epsilon = 1e-5);
    }

    #[test]
    fn test_reports_non_convergence() {
        // Equal-magnitude eigenvalues of opposite sign never settle.
        let matrix = vec![1.0, 0.0, 0.0, -1.0];
        let mut output = vec![0.0; 2];
        let res = PowerIterations::default()
            .with_iterations(20)
            .run(2, &matrix, &mut output, &mut engine(2));
        assert_eq!(res.iterations, None);
    }

    #[test]
    fn test_order_one() {
        let mut output = vec![0.0f32];
        let res = PowerIterations::default().run(1, &[4.0f32], &mut output, &mut engine(8));
        assert_eq!(res.iterations, Some(1));
        assert_abs_diff_eq!(res.eigenvalue, 4.0, epsilon = 1e-6);
    }
}
