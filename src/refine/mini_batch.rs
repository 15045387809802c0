//! Mini-batch k-means (Sculley, 2010).
//!
//! Each iteration samples a batch of observations, assigns them to their
//! closest centroids and nudges those centroids towards them. A centroid is
//! the running mean of every observation ever sampled into its cluster, so
//! updates shrink as the run goes on and the centroids settle.
//!
//! Every `convergence_history` iterations, the proportion of sampled
//! observations that switched to or from each cluster over that window is
//! checked; if it is below `max_change_proportion` for all clusters the run
//! stops early. A final pass over the full data set then produces the
//! reported assignments and centroids.

use log::{debug, trace, warn};

use crate::centroids::{compute_centroids, compute_sizes, compute_wcss, is_edge_case, process_edge_case};
use crate::details::{Details, Status};
use crate::error::Result;
use crate::matrix::{cast, check_buffers, column_mut, Matrix, Scalar};
use crate::parallel::Executor;
use crate::random::{engine, sample_without_replacement};
use crate::refine::{assign_nearest, Refine};
use crate::vp_tree::VpTree;

/// Configuration for [`MiniBatch`].
#[derive(Debug, Clone)]
pub struct MiniBatchConfig {
    /// Maximum number of mini-batch iterations.
    pub max_iterations: usize,
    /// Observations sampled per iteration.
    pub batch_size: usize,
    /// Largest proportion of reassigned observations per cluster that still
    /// counts as converged.
    pub max_change_proportion: f64,
    /// Number of iterations between convergence checks.
    pub convergence_history: usize,
    /// Seed for sampling the batches.
    pub seed: u64,
    /// Workers used for the assignment steps.
    pub num_threads: usize,
}

impl Default for MiniBatchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            batch_size: 500,
            max_change_proportion: 0.01,
            convergence_history: 10,
            seed: 1234567890,
            num_threads: 1,
        }
    }
}

impl MiniBatchConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_change_proportion(mut self, max_change_proportion: f64) -> Self {
        self.max_change_proportion = max_change_proportion;
        self
    }

    pub fn with_convergence_history(mut self, convergence_history: usize) -> Self {
        self.convergence_history = convergence_history;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }
}

/// Mini-batch refinement.
///
/// Status codes: [`Status::Converged`], [`Status::MaxIterationsReached`],
/// and [`Status::EmptyCluster`] if the final full pass leaves a cluster
/// without observations.
#[derive(Debug, Clone, Default)]
pub struct MiniBatch {
    config: MiniBatchConfig,
}

impl MiniBatch {
    pub fn new(config: MiniBatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MiniBatchConfig {
        &self.config
    }
}

impl<T: Scalar> Refine<T> for MiniBatch {
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
        let history = self.config.convergence_history.max(1);
        let batch_size = self.config.batch_size.min(nobs);
        let mut rng = engine(self.config.seed);

        let mut total_sampled = vec![0usize; ncenters];
        // Labels written by this run; incoming labels are never compared.
        let mut previous: Vec<Option<usize>> = vec![None; nobs];
        let mut last_changed = vec![0usize; ncenters];
        let mut last_sampled = vec![0usize; ncenters];
        let mut batch_labels = vec![0usize; batch_size];
        let mut status = Status::Converged;
        let mut iter = 1;

        while iter <= max_iterations {
            let chosen = sample_without_replacement(nobs, batch_size, &mut rng);
            let index = VpTree::new(ndim, ncenters, centers);
            assign_nearest(&executor, points, &index, Some(&chosen), &mut batch_labels)?;

            // Running mean over everything ever sampled into the cluster.
            for (&o, &c) in chosen.iter().zip(&batch_labels) {
                total_sampled[c] += 1;
                let n: T = cast(total_sampled[c]);
                for (x, &v) in column_mut(centers, ndim, c).iter_mut().zip(points.column(o)) {
                    *x = *x + (v - *x) / n;
                }
            }

            for (&o, &after) in chosen.iter().zip(&batch_labels) {
                if iter > 1 {
                    if let Some(before) = previous[o] {
                        last_sampled[before] += 1;
                        if before != after {
                            last_sampled[after] += 1;
                            last_changed[before] += 1;
                            last_changed[after] += 1;
                        }
                    } else {
                        last_sampled[after] += 1;
                    }
                }
                clusters[o] = after;
                previous[o] = Some(after);
            }

            if iter > 1 && (iter - 1) % history == 0 {
                let max_change = self.config.max_change_proportion;
                let too_many_changes = last_changed
                    .iter()
                    .zip(&last_sampled)
                    .any(|(&changed, &sampled)| changed as f64 >= sampled as f64 * max_change);
                trace!(
                    "mini-batch iteration {}: {} reassignments in the last {} batches",
                    iter,
                    last_changed.iter().sum::<usize>() / 2,
                    history
                );
                if !too_many_changes {
                    break;
                }
                last_sampled.fill(0);
                last_changed.fill(0);
            }

            iter += 1;
        }

        if iter > max_iterations {
            warn!("mini-batch did not converge within {} iterations", max_iterations);
            status = Status::MaxIterationsReached;
        } else {
            debug!("mini-batch converged after {} iterations", iter);
        }

        // Final labels come from a pass over every observation.
        let index = VpTree::new(ndim, ncenters, centers);
        let mut assigned = vec![0usize; nobs];
        assign_nearest(&executor, points, &index, None, &mut assigned)?;
        clusters.copy_from_slice(&assigned);

        let sizes = compute_sizes(ncenters, clusters);
        if sizes.contains(&0) {
            warn!("mini-batch left at least one cluster empty");
            status = Status::EmptyCluster;
        }
        compute_centroids(points, ncenters, centers, clusters, &sizes);
        let wcss = compute_wcss(points, ncenters, centers, clusters);
        Ok(Details::new(sizes, wcss, iter, status))
    }
}
