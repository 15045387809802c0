//! Lloyd's algorithm (Lloyd, 1982).
//!
//! Alternates between assigning every observation to its closest centroid
//! and recomputing each centroid as the mean of its observations, until no
//! observation changes cluster or the iteration budget runs out.

use log::{debug, trace, warn};

use crate::centroids::{compute_centroids, compute_sizes, compute_wcss, is_edge_case, process_edge_case};
use crate::details::{Details, Status};
use crate::error::Result;
use crate::matrix::{check_buffers, Matrix, Scalar};
use crate::parallel::Executor;
use crate::refine::{assign_nearest, Refine};
use crate::vp_tree::VpTree;

/// Configuration for [`Lloyd`].
#[derive(Debug, Clone)]
pub struct LloydConfig {
    /// Maximum number of assign/update rounds.
    pub max_iterations: usize,
    /// Workers used for the assignment step.
    pub num_threads: usize,
}

impl Default for LloydConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            num_threads: 1,
        }
    }
}

impl LloydConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }
}

/// Lloyd refinement.
///
/// Status codes: [`Status::Converged`], [`Status::EmptyCluster`] if some
/// cluster lost all its observations along the way, and
/// [`Status::MaxIterationsReached`].
#[derive(Debug, Clone, Default)]
pub struct Lloyd {
    config: LloydConfig,
}

impl Lloyd {
    pub fn new(config: LloydConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LloydConfig {
        &self.config
    }
}

impl<T: Scalar> Refine<T> for Lloyd {
    fn run(
        &self,
        points: &Matrix<'_, T>,
        ncenters: usize,
        centers: &mut [T],
        clusters: &mut [usize],
    ) -> Result<Details<T>> {
        check_buffers(points, ncenters, centers, clusters)?;
        let nobs = points.ncols();
        if is_edge_case(nobs, ncenters) {
            return Ok(process_edge_case(points, ncenters, centers, clusters));
        }

        let executor = Executor::new(self.config.num_threads)?;
        let ndim = points.ndim();
        let max_iterations = self.config.max_iterations;
        let mut status = Status::Converged;
        let mut assigned = vec![0; nobs];
        let mut iter = 1;

        while iter <= max_iterations {
            let index = VpTree::new(ndim, ncenters, centers);
            assign_nearest(&executor, points, &index, None, &mut assigned)?;

            let changed = assigned
                .iter()
                .zip(clusters.iter())
                .filter(|(a, b)| a != b)
                .count();
            if changed == 0 {
                break;
            }
            trace!("Lloyd iteration {}: {} observations reassigned", iter, changed);
            clusters.copy_from_slice(&assigned);

            let sizes = compute_sizes(ncenters, clusters);
            if sizes.contains(&0) {
                status = Status::EmptyCluster;
            }
            compute_centroids(points, ncenters, centers, clusters, &sizes);
            iter += 1;
        }

        if max_iterations == 0 {
            // Incoming labels may refer to clusters that no longer exist.
            let index = VpTree::new(ndim, ncenters, centers);
            assign_nearest(&executor, points, &index, None, &mut assigned)?;
            clusters.copy_from_slice(&assigned);
        }

        if iter > max_iterations {
            warn!("Lloyd did not converge within {} iterations", max_iterations);
            status = Status::MaxIterationsReached;
        } else if status == Status::EmptyCluster {
            warn!("Lloyd produced at least one empty cluster");
        } else {
            debug!("Lloyd converged after {} iterations", iter);
        }

        let sizes = compute_sizes(ncenters, clusters);
        let wcss = compute_wcss(points, ncenters, centers, clusters);
        Ok(Details::new(sizes, wcss, iter, status))
    }
}
