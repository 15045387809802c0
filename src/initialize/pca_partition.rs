//! PCA partitioning (Su and Dy, 2007).
//!
//! Starting from one cluster holding every observation, the most dispersed
//! cluster is repeatedly split in two by the hyperplane through its center
//! that is orthogonal to its first principal component.
//!
//! Dispersion is the mean squared distance to the center multiplied by the
//! cluster size raised to `size_adjustment`. An adjustment of 1 is the
//! original within-cluster sum of squares; smaller values weaken the
//! preference for splitting large clusters, and 0 ignores size altogether.
//!
//! The principal component comes from power iterations with a random start,
//! so results depend on the seed.

use log::debug;
use rand::Rng;

use crate::error::Result;
use crate::initialize::Initialize;
use crate::matrix::{cast, check_buffers, column, column_mut, Matrix, Scalar};
use crate::power_iterations::PowerIterations;
use crate::random::engine;

/// Configuration for [`PcaPartition`].
#[derive(Debug, Clone)]
pub struct PcaPartitionConfig {
    /// Seed for the power iterations' starting vectors.
    pub seed: u64,
    /// Exponent applied to cluster sizes when choosing what to split, in
    /// `[0, 1]`.
    pub size_adjustment: f64,
    /// Settings for the principal component search.
    pub power: PowerIterations,
}

impl Default for PcaPartitionConfig {
    fn default() -> Self {
        Self {
            seed: 6523,
            size_adjustment: 1.0,
            power: PowerIterations::default(),
        }
    }
}

impl PcaPartitionConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_size_adjustment(mut self, size_adjustment: f64) -> Self {
        self.size_adjustment = size_adjustment;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.power.iterations = iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.power.tolerance = tolerance;
        self
    }
}

/// PCA partitioning initialization.
///
/// Besides the centers, the cluster of each observation is written to the
/// `clusters` buffer.
#[derive(Debug, Clone, Default)]
pub struct PcaPartition {
    config: PcaPartitionConfig,
}

impl PcaPartition {
    pub fn new(config: PcaPartitionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PcaPartitionConfig {
        &self.config
    }

    /// First principal component of the observations in `members`, around
    /// `center`.
    fn compute_pc1<T: Scalar, R: Rng + ?Sized>(
        &self,
        points: &Matrix<'_, T>,
        members: &[usize],
        center: &[T],
        rng: &mut R,
    ) -> Vec<T> {
        let ndim = points.ndim();
        let mut delta = vec![T::zero(); ndim];
        let mut cov = vec![T::zero(); ndim * ndim];

        // Lower triangle first, then mirror it.
        for &i in members {
            for (d, (&x, &c)) in delta.iter_mut().zip(points.column(i).iter().zip(center)) {
                *d = x - c;
            }
            for j in 0..ndim {
                for k in 0..=j {
                    cov[j * ndim + k] = cov[j * ndim + k] + delta[j] * delta[k];
                }
            }
        }
        for j in 0..ndim {
            for k in (j + 1)..ndim {
                cov[j * ndim + k] = cov[k * ndim + j];
            }
        }

        let mut pc1 = vec![T::zero(); ndim];
        self.config.power.run(ndim, &cov, &mut pc1, rng);
        pc1
    }
}

/// Writes the mean of `members` into `center` and returns the mean squared
/// distance of the members to it.
fn update_center<T: Scalar>(points: &Matrix<'_, T>, members: &[usize], center: &mut [T]) -> T {
    center.fill(T::zero());
    for &i in members {
        for (c, &x) in center.iter_mut().zip(points.column(i)) {
            *c = *c + x;
        }
    }
    let n: T = cast(members.len());
    for c in center.iter_mut() {
        *c = *c / n;
    }

    let mut ss = T::zero();
    for &i in members {
        for (&c, &x) in center.iter().zip(points.column(i)) {
            ss = ss + (x - c) * (x - c);
        }
    }
    ss / n
}

impl<T: Scalar> Initialize<T> for PcaPartition {
    fn run(
        &self,
        points: &Matrix<'_, T>,
        ncenters: usize,
        centers: &mut [T],
        clusters: &mut [usize],
    ) -> Result<usize> {
        check_buffers(points, ncenters, centers, clusters)?;
        let nobs = points.ncols();
        if nobs == 0 || ncenters == 0 {
            return Ok(0);
        }

        let ndim = points.ndim();
        let mut rng = engine(self.config.seed);
        let adjust: T = cast(self.config.size_adjustment);
        let mut mrse = vec![T::zero(); ncenters];
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); ncenters];

        // The first cluster's dispersion is never compared, so it is not needed.
        members[0] = (0..nobs).collect();
        update_center(points, &members[0], column_mut(centers, ndim, 0));
        clusters.fill(0);

        for cluster in 1..ncenters {
            let mut worst_ss = T::zero();
            let mut worst = 0;
            for (i, group) in members[..cluster].iter().enumerate() {
                let mut multiplier: T = cast(group.len());
                if self.config.size_adjustment != 1.0 {
                    multiplier = multiplier.powf(adjust);
                }
                let pseudo_ss = mrse[i] * multiplier;
                if pseudo_ss > worst_ss {
                    worst_ss = pseudo_ss;
                    worst = i;
                }
            }

            let worst_center = column(centers, ndim, worst).to_vec();
            let pc1 = self.compute_pc1(points, &members[worst], &worst_center, &mut rng);

            // The center projects to zero; the positive side moves out.
            let (moved, kept): (Vec<usize>, Vec<usize>) =
                members[worst].iter().partition(|&&i| {
                    let proj = points
                        .column(i)
                        .iter()
                        .zip(&worst_center)
                        .zip(&pc1)
                        .fold(T::zero(), |acc, ((&x, &c), &p)| acc + (x - c) * p);
                    proj > T::zero()
                });

            // A one-sided split means every point in the cluster is identical,
            // and the same cluster would be picked again forever.
            if moved.is_empty() || kept.is_empty() {
                debug!(
                    "PCA partitioning stopped at {} of {} centers on coincident points",
                    cluster, ncenters
                );
                return Ok(cluster);
            }

            for &i in &moved {
                clusters[i] = cluster;
            }
            mrse[cluster] = update_center(points, &moved, column_mut(centers, ndim, cluster));
            mrse[worst] = update_center(points, &kept, column_mut(centers, ndim, worst));
            members[cluster] = moved;
            members[worst] = kept;
        }

        Ok(ncenters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::engine;
    use approx::assert_abs_diff_eq;
    use rand::Rng;

    fn two_blobs() -> Vec<f64> {
        let mut rng = engine(123);
        let mut values = Vec::new();
        for &(cx, cy) in &[(-10.0, -10.0), (10.0, 10.0)] {
            for _ in 0..25 {
                values.push(cx + rng.gen::<f64>());
                values.push(cy + rng.gen::<f64>());
            }
        }
        values
    }

    #[test]
    fn test_splits_along_principal_axis() {
        let values = two_blobs();
        let points = Matrix::new(2, 50, &values).unwrap();
        let mut centers = vec![0.0; 4];
        let mut clusters = vec![0; 50];
        let filled = PcaPartition::default()
            .run(&points, 2, &mut centers, &mut clusters)
            .unwrap();
        assert_eq!(filled, 2);

        // Each blob ends up in a cluster of its own.
        assert!(clusters[..25].iter().all(|&c| c == clusters[0]));
        assert!(clusters[25..].iter().all(|&c| c == clusters[25]));
        assert_ne!(clusters[0], clusters[25]);

        // Centers are the blob means.
        let first = &centers[clusters[0] * 2..clusters[0] * 2 + 2];
        let expected_x = values[..50].iter().step_by(2).sum::<f64>() / 25.0;
        assert_abs_diff_eq!(first[0], expected_x, epsilon = 1e-10);
    }

    #[test]
    fn test_assignments_match_centers() {
        let values = two_blobs();
        let points = Matrix::new(2, 50, &values).unwrap();
        let mut centers = vec![0.0; 10];
        let mut clusters = vec![0; 50];
        let filled = PcaPartition::default()
            .run(&points, 5, &mut centers, &mut clusters)
            .unwrap();
        assert_eq!(filled, 5);

        let sizes = crate::centroids::compute_sizes(5, &clusters);
        assert!(sizes.iter().all(|&s| s > 0));
        let mut recomputed = centers.clone();
        crate::centroids::compute_centroids(&points, 5, &mut recomputed, &clusters, &sizes);
        for (a, b) in centers.iter().zip(&recomputed) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_stops_on_coincident_points() {
        let values = vec![1.0, 1.0, 1.0, 1.0, 4.0, 4.0];
        let points = Matrix::new(2, 3, &values).unwrap();
        let mut centers = vec![0.0; 6];
        let mut clusters = vec![0; 3];
        let filled = PcaPartition::default()
            .run(&points, 3, &mut centers, &mut clusters)
            .unwrap();
        assert_eq!(filled, 2);
    }

    #[test]
    fn test_size_adjustment_and_seed_are_deterministic() {
        let values = two_blobs();
        let points = Matrix::new(2, 50, &values).unwrap();
        let init = PcaPartition::new(
            PcaPartitionConfig::default()
                .with_size_adjustment(0.5)
                .with_seed(9),
        );
        let mut a = vec![0.0; 8];
        let mut b = vec![0.0; 8];
        init.run(&points, 4, &mut a, &mut [0; 50]).unwrap();
        init.run(&points, 4, &mut b, &mut [0; 50]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_observations() {
        let values: Vec<f64> = Vec::new();
        let points = Matrix::new(2, 0, &values).unwrap();
        let mut centers = vec![5.0; 4];
        assert_eq!(
            PcaPartition::default().run(&points, 2, &mut centers, &mut []).unwrap(),
            0
        );
        assert_eq!(centers, vec![5.0; 4]);
    }
}
