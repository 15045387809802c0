//! Strategies for choosing starting centroids.

pub mod kmeans_pp;
pub mod none;
pub mod pca_partition;
pub mod random;

use crate::error::Result;
use crate::matrix::{column, column_mut, Matrix, Scalar};

pub use kmeans_pp::{KmeansPlusPlus, KmeansPlusPlusConfig};
pub use none::NoInit;
pub use pca_partition::{PcaPartition, PcaPartitionConfig};
pub use random::{RandomConfig, RandomSample};

/// Chooses initial cluster centers from the data.
pub trait Initialize<T: Scalar> {
    /// Fills the leading columns of the column-major `centers` buffer (room
    /// for `ncenters` columns of `points.ndim()` values) and returns how many
    /// were filled.
    ///
    /// The count can be smaller than `ncenters`, e.g. when there are fewer
    /// distinct observations than centers; trailing columns are then
    /// unspecified. `clusters` holds one entry per observation and may be
    /// used as scratch space; its content on return depends on the strategy.
    /// With no observations, nothing is touched and zero is returned.
    fn run(
        &self,
        points: &Matrix<'_, T>,
        ncenters: usize,
        centers: &mut [T],
        clusters: &mut [usize],
    ) -> Result<usize>;
}

/// Copies the chosen observations into consecutive centroid columns.
pub(crate) fn copy_into_centers<T: Scalar>(
    points: &Matrix<'_, T>,
    chosen: &[usize],
    centers: &mut [T],
) {
    let ndim = points.ndim();
    for (c, &obs) in chosen.iter().enumerate() {
        column_mut(centers, ndim, c).copy_from_slice(column(points.values(), ndim, obs));
    }
}
