use crate::error::Result;
use crate::initialize::Initialize;
use crate::matrix::{check_buffers, Matrix, Scalar};

/// Uses the centroids already present in the buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInit;

impl NoInit {
    pub fn new() -> Self {
        Self
    }
}

impl<T: Scalar> Initialize<T> for NoInit {
    /// Leaves `centers` and `clusters` untouched and reports the smaller of
    /// `ncenters` and the number of observations.
    fn run(
        &self,
        points: &Matrix<'_, T>,
        ncenters: usize,
        centers: &mut [T],
        clusters: &mut [usize],
    ) -> Result<usize> {
        check_buffers(points, ncenters, centers, clusters)?;
        Ok(points.ncols().min(ncenters))
    }
}
