//! Strategies for improving centroids and assignments to a local optimum of
//! the within-cluster sum of squares.

pub mod hartigan_wong;
pub mod lloyd;
pub mod mini_batch;


use crate::details::Details;
use crate::error::Result;
use crate::matrix::{Matrix, Scalar};
use crate::parallel::Executor;
use crate::vp_tree::VpTree;

pub use hartigan_wong::{HartiganWong, HartiganWongConfig};
pub use lloyd::{Lloyd, LloydConfig};
pub use mini_batch::{MiniBatch, MiniBatchConfig};

/// Iteratively refines cluster centers and assignments.
pub trait Refine<T: Scalar> {
    /// Refines the first `ncenters` columns of the column-major `centers`
    /// buffer, which hold the starting centroids, and writes the final
    /// cluster of each observation into `clusters`.
    ///
    /// If `ncenters` exceeds the number of observations only the first
    /// `nobs` centroids are meaningful on return.
    fn run(
        &self,
        points: &Matrix<'_, T>,
        ncenters: usize,
        centers: &mut [T],
        clusters: &mut [usize],
    ) -> Result<Details<T>>;
}

/// Assigns each listed observation to its nearest centroid, writing the
/// result into the matching slot of `output`.
pub(crate) fn assign_nearest<T: Scalar>(
    executor: &Executor,
    points: &Matrix<'_, T>,
    index: &VpTree<'_, T>,
    observations: Option<&[usize]>,
    output: &mut [usize],
) -> Result<()> {
    executor.for_each_chunk(output, |_, start, chunk| {
        for (i, slot) in chunk.iter_mut().enumerate() {
            let obs = observations.map_or(start + i, |o| o[start + i]);
            *slot = index.find(points.column(obs));
        }
        Ok(())
    })
}
