//! Top-level driver that chains an initializer and a refiner.

use log::debug;

use crate::details::Details;
use crate::error::{Error, Result};
use crate::initialize::{Initialize, KmeansPlusPlus, KmeansPlusPlusConfig};
use crate::matrix::{check_buffers, Matrix, Scalar};
use crate::refine::{HartiganWong, HartiganWongConfig, Refine};

/// Output of [`Kmeans::run_owned`].
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansResults<T> {
    /// Column-major centroids, `ndim` values per cluster.
    pub centers: Vec<T>,
    /// Cluster of each observation.
    pub clusters: Vec<usize>,
    pub details: Details<T>,
}

/// k-means clustering with pluggable initialization and refinement.
///
/// Without explicit strategies, k-means++ seeding is followed by
/// Hartigan-Wong refinement. `seed` and `num_threads` only configure those
/// defaults; strategies passed in keep their own settings.
#[derive(Debug, Clone)]
pub struct Kmeans {
    pub seed: u64,
    pub num_threads: usize,
}

impl Default for Kmeans {
    fn default() -> Self {
        Self {
            seed: 5489,
            num_threads: 1,
        }
    }
}

impl Kmeans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Clusters `points` into `ncenters` groups, writing the centroids into
    /// `centers` (`ndim * ncenters` values) and the labels into `clusters`.
    ///
    /// Only the centers the initializer manages to fill are refined; if it
    /// returns fewer than `ncenters`, `Details` covers that many clusters.
    pub fn run<T: Scalar>(
        &self,
        points: &Matrix<'_, T>,
        ncenters: usize,
        centers: &mut [T],
        clusters: &mut [usize],
        initializer: Option<&dyn Initialize<T>>,
        refiner: Option<&dyn Refine<T>>,
    ) -> Result<Details<T>> {
        if points.ncols() == 0 {
            return Err(Error::EmptyInput);
        }
        if ncenters == 0 {
            return Err(Error::NoCenters);
        }
        check_buffers(points, ncenters, centers, clusters)?;

        let default_init;
        let initializer: &dyn Initialize<T> = match initializer {
            Some(init) => init,
            None => {
                default_init = KmeansPlusPlus::new(
                    KmeansPlusPlusConfig::default()
                        .with_seed(self.seed)
                        .with_num_threads(self.num_threads),
                );
                &default_init
            }
        };

        let default_refine;
        let refiner: &dyn Refine<T> = match refiner {
            Some(refine) => refine,
            None => {
                default_refine = HartiganWong::new(
                    HartiganWongConfig::default().with_num_threads(self.num_threads),
                );
                &default_refine
            }
        };

        let filled = initializer.run(points, ncenters, centers, clusters)?;
        if filled < ncenters {
            debug!("initialization filled {} of {} centers", filled, ncenters);
        }
        refiner.run(points, filled, centers, clusters)
    }

    /// Like [`Kmeans::run`], but allocates the output buffers.
    pub fn run_owned<T: Scalar>(
        &self,
        points: &Matrix<'_, T>,
        ncenters: usize,
        initializer: Option<&dyn Initialize<T>>,
        refiner: Option<&dyn Refine<T>>,
    ) -> Result<KmeansResults<T>> {
        let mut centers = vec![T::zero(); points.ndim() * ncenters];
        let mut clusters = vec![0; points.ncols()];
        let details = self.run(points, ncenters, &mut centers, &mut clusters, initializer, refiner)?;
        Ok(KmeansResults {
            centers,
            clusters,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::Status;
    use crate::initialize::{NoInit, PcaPartition, RandomSample};
    use crate::random::engine;
    use crate::refine::{Lloyd, MiniBatch};
    use approx::assert_abs_diff_eq;
    use rand::Rng;

    fn three_groups() -> Vec<f64> {
        let mut rng = engine(2024);
        let mut values = Vec::new();
        for &(cx, cy) in &[(0.0, 0.0), (30.0, 0.0), (100.0, 0.0)] {
            for _ in 0..40 {
                values.push(cx + rng.gen::<f64>());
                values.push(cy + rng.gen::<f64>());
            }
        }
        values
    }

    fn assert_groups_recovered(clusters: &[usize]) {
        for g in 0..3 {
            let group = &clusters[g * 40..(g + 1) * 40];
            assert!(group.iter().all(|&c| c == group[0]));
        }
        assert_ne!(clusters[0], clusters[40]);
        assert_ne!(clusters[0], clusters[80]);
        assert_ne!(clusters[40], clusters[80]);
    }

    #[test]
    fn test_defaults() {
        let values = three_groups();
        let points = Matrix::new(2, 120, &values).unwrap();
        let results = Kmeans::default().run_owned(&points, 3, None, None).unwrap();
        assert_eq!(results.details.status, Status::Converged);
        assert_eq!(results.details.sizes.iter().sum::<usize>(), 120);
        assert_eq!(results.centers.len(), 6);
        assert_groups_recovered(&results.clusters);
    }

    #[test]
    fn test_every_initializer_with_lloyd() {
        let values = three_groups();
        let points = Matrix::new(2, 120, &values).unwrap();
        let initializers: Vec<Box<dyn Initialize<f64>>> = vec![
            Box::new(KmeansPlusPlus::default()),
            Box::new(PcaPartition::default()),
        ];
        for init in &initializers {
            let results = Kmeans::default()
                .run_owned(&points, 3, Some(init.as_ref()), Some(&Lloyd::default()))
                .unwrap();
            assert_eq!(results.details.status, Status::Converged);
            assert_groups_recovered(&results.clusters);
        }

        // Random sampling gives no spread guarantee; only check consistency.
        let results = Kmeans::default()
            .run_owned(&points, 3, Some(&RandomSample::default()), Some(&MiniBatch::default()))
            .unwrap();
        assert_eq!(results.details.sizes.iter().sum::<usize>(), 120);
    }

    #[test]
    fn test_caller_supplied_centers() {
        let values = three_groups();
        let points = Matrix::new(2, 120, &values).unwrap();
        let mut centers = vec![1.0, 1.0, 29.0, 1.0, 99.0, 1.0];
        let mut clusters = vec![0; 120];
        let details = Kmeans::default()
            .run(&points, 3, &mut centers, &mut clusters, Some(&NoInit), None)
            .unwrap();
        assert_eq!(details.status, Status::Converged);
        assert!(clusters[..40].iter().all(|&c| c == 0));
        assert!(clusters[40..80].iter().all(|&c| c == 1));
        let mean_x = values[80..160].iter().step_by(2).sum::<f64>() / 40.0;
        assert_abs_diff_eq!(centers[2], mean_x, epsilon = 1e-10);
    }

    #[test]
    fn test_fewer_filled_centers_are_refined() {
        // Only two distinct points, so k-means++ stops after two picks.
        let values = vec![1.0, 1.0, 1.0, 5.0, 5.0];
        let points = Matrix::new(1, 5, &values).unwrap();
        let results = Kmeans::default().run_owned(&points, 4, None, None).unwrap();
        assert_eq!(results.details.sizes.len(), 2);
        assert_eq!(results.details.sizes.iter().sum::<usize>(), 5);
        assert_eq!(results.centers.len(), 4);
    }

    #[test]
    fn test_rejects_empty_input_and_zero_centers() {
        let empty: Vec<f64> = Vec::new();
        let points = Matrix::new(2, 0, &empty).unwrap();
        assert!(matches!(
            Kmeans::default().run_owned(&points, 2, None, None),
            Err(Error::EmptyInput)
        ));

        let values = vec![1.0, 2.0];
        let points = Matrix::new(1, 2, &values).unwrap();
        assert!(matches!(
            Kmeans::default().run_owned(&points, 0, None, None),
            Err(Error::NoCenters)
        ));
    }

    #[test]
    fn test_seed_and_threads() {
        let values = three_groups();
        let points = Matrix::new(2, 120, &values).unwrap();
        let serial = Kmeans::default().with_seed(7).run_owned(&points, 5, None, None).unwrap();
        let again = Kmeans::default().with_seed(7).run_owned(&points, 5, None, None).unwrap();
        let threaded = Kmeans::default()
            .with_seed(7)
            .with_num_threads(4)
            .run_owned(&points, 5, None, None)
            .unwrap();
        assert_eq!(serial, again);
        assert_eq!(serial, threaded);
    }
}
