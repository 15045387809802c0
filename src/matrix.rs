//! Column-major dense storage shared by the point set and the centroids.
//!
//! Both the observations and the cluster centers are stored as flat buffers
//! of `ndim * n` values, where each column (a contiguous run of `ndim` values)
//! is one observation or one centroid.

use num_traits::{Float, ToPrimitive};
use std::fmt::Debug;

use crate::error::{Error, Result};

/// Floating-point type usable for observations and centroids.
pub trait Scalar: Float + Debug + Send + Sync + 'static {}

impl<T> Scalar for T where T: Float + Debug + Send + Sync + 'static {}

/// Converts a count or a configuration constant into the scalar type.
pub(crate) fn cast<T: Scalar, N: ToPrimitive>(value: N) -> T {
    T::from(value).unwrap_or_else(T::max_value)
}

/// Borrowed `ndim`-by-`ncols` column-major matrix.
#[derive(Debug, Clone, Copy)]
pub struct Matrix<'a, T> {
    ndim: usize,
    ncols: usize,
    values: &'a [T],
}

impl<'a, T: Scalar> Matrix<'a, T> {
    /// Wraps `values`, checking that it holds exactly `ndim * ncols` entries.
    pub fn new(ndim: usize, ncols: usize, values: &'a [T]) -> Result<Self> {
        if ndim == 0 {
            return Err(Error::ZeroDimensions);
        }
        let expected = ndim * ncols;
        if values.len() != expected {
            return Err(Error::BufferLength {
                name: "data",
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            ndim,
            ncols,
            values,
        })
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of columns, i.e. observations for a point set.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn values(&self) -> &'a [T] {
        self.values
    }

    /// Returns the `i`-th column.
    pub fn column(&self, i: usize) -> &'a [T] {
        column(self.values, self.ndim, i)
    }
}

/// Returns column `i` of a flat column-major buffer.
pub fn column<T>(values: &[T], ndim: usize, i: usize) -> &[T] {
    &values[i * ndim..(i + 1) * ndim]
}

/// Returns column `i` of a flat column-major buffer, mutably.
pub fn column_mut<T>(values: &mut [T], ndim: usize, i: usize) -> &mut [T] {
    &mut values[i * ndim..(i + 1) * ndim]
}

/// Squared Euclidean distance between two vectors of the same length.
pub fn squared_distance<T: Scalar>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + (x - y) * (x - y))
}

/// Checks that the centroid and assignment buffers can hold `ncenters`
/// centers and one label per observation.
pub(crate) fn check_buffers<T: Scalar>(
    points: &Matrix<'_, T>,
    ncenters: usize,
    centers: &[T],
    clusters: &[usize],
) -> Result<()> {
    let expected = points.ndim() * ncenters;
    if centers.len() < expected {
        return Err(Error::BufferLength {
            name: "centers",
            expected,
            found: centers.len(),
        });
    }
    if clusters.len() != points.ncols() {
        return Err(Error::BufferLength {
            name: "clusters",
            expected: points.ncols(),
            found: clusters.len(),
        });
    }
    Ok(())
}
