//! k-means++ seeding (Arthur and Vassilvitskii, 2007).
//!
//! Each new starting point is sampled with probability proportional to its
//! squared distance from the closest point chosen so far, which spreads the
//! starting centroids across the data.

use log::debug;

use crate::error::Result;
use crate::initialize::{copy_into_centers, Initialize};
use crate::matrix::{check_buffers, squared_distance, Matrix, Scalar};
use crate::parallel::Executor;
use crate::random::{engine, weighted_sample};

/// Configuration for [`KmeansPlusPlus`].
#[derive(Debug, Clone)]
pub struct KmeansPlusPlusConfig {
    /// Seed for the sampling engine.
    pub seed: u64,
    /// Workers used to update the distances after each pick.
    pub num_threads: usize,
}

impl Default for KmeansPlusPlusConfig {
    fn default() -> Self {
        Self {
            seed: 6523,
            num_threads: 1,
        }
    }
}

impl KmeansPlusPlusConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }
}

/// k-means++ initialization.
#[derive(Debug, Clone, Default)]
pub struct KmeansPlusPlus {
    config: KmeansPlusPlusConfig,
}

impl KmeansPlusPlus {
    pub fn new(config: KmeansPlusPlusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KmeansPlusPlusConfig {
        &self.config
    }

    /// Picks up to `ncenters` observation indices.
    ///
    /// Stops early once every remaining observation duplicates a chosen one.
    pub fn choose<T: Scalar>(&self, points: &Matrix<'_, T>, ncenters: usize) -> Result<Vec<usize>> {
        let nobs = points.ncols();
        let mut chosen: Vec<usize> = Vec::with_capacity(ncenters);
        if nobs == 0 {
            return Ok(chosen);
        }

        let executor = Executor::new(self.config.num_threads)?;
        let mut rng = engine(self.config.seed);

        // One means "not computed yet"; zero marks chosen points and their duplicates.
        let mut mindist = vec![T::one(); nobs];
        let mut cumulative = vec![T::zero(); nobs];

        for cen in 0..ncenters {
            if let Some(&last) = chosen.last() {
                let latest = points.column(last);
                executor.for_each_chunk(&mut mindist, |_, start, chunk| {
                    for (i, dist) in chunk.iter_mut().enumerate() {
                        if *dist == T::zero() {
                            continue;
                        }
                        let r2 = squared_distance(points.column(start + i), latest);
                        if cen == 1 || r2 < *dist {
                            *dist = r2;
                        }
                    }
                    Ok(())
                })?;
            }

            let mut total = T::zero();
            for (cum, &dist) in cumulative.iter_mut().zip(&mindist) {
                total = total + dist;
                *cum = total;
            }

            if total == T::zero() {
                debug!(
                    "k-means++ ran out of distinct observations after {} of {} centers",
                    chosen.len(),
                    ncenters
                );
                break;
            }

            let id = weighted_sample(&cumulative, &mindist, &mut rng);
            mindist[id] = T::zero();
            chosen.push(id);
        }

        Ok(chosen)
    }
}

impl<T: Scalar> Initialize<T> for KmeansPlusPlus {
    fn run(
        &self,
        points: &Matrix<'_, T>,
        ncenters: usize,
        centers: &mut [T],
        clusters: &mut [usize],
    ) -> Result<usize> {
        check_buffers(points, ncenters, centers, clusters)?;
        let chosen = self.choose(points, ncenters)?;
        copy_into_centers(points, &chosen, centers);
        Ok(chosen.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::column;
    use crate::random::engine;
    use rand::Rng;

    #[test]
    fn test_picks_distinct_points() {
        let mut rng = engine(10);
        let values: Vec<f64> = (0..3 * 200).map(|_| rng.gen::<f64>()).collect();
        let points = Matrix::new(3, 200, &values).unwrap();
        let chosen = KmeansPlusPlus::default().choose(&points, 10).unwrap();
        let mut sorted = chosen.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 10);
    }

    #[test]
    fn test_spreads_over_separated_groups() {
        // Three tight, far-apart groups of ten points.
        let mut values = Vec::new();
        for &(cx, cy) in &[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)] {
            for i in 0..10 {
                values.push(cx + (i as f64) * 0.01);
                values.push(cy - (i as f64) * 0.01);
            }
        }
        let points = Matrix::new(2, 30, &values).unwrap();
        for seed in 0..10 {
            let init = KmeansPlusPlus::new(KmeansPlusPlusConfig::default().with_seed(seed));
            let mut groups: Vec<usize> = init
                .choose(&points, 3)
                .unwrap()
                .into_iter()
                .map(|i| i / 10)
                .collect();
            groups.sort_unstable();
            assert_eq!(groups, vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_stops_on_duplicates() {
        let values = vec![1.0, 1.0, 1.0, 5.0, 5.0];
        let points = Matrix::new(1, 5, &values).unwrap();
        let mut centers = vec![0.0; 4];
        let filled = KmeansPlusPlus::default()
            .run(&points, 4, &mut centers, &mut [0; 5])
            .unwrap();
        assert_eq!(filled, 2);
        let mut firsts = vec![column(&centers, 1, 0)[0], column(&centers, 1, 1)[0]];
        firsts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(firsts, vec![1.0, 5.0]);
    }

    #[test]
    fn test_deterministic_across_threads() {
        let mut rng = engine(4);
        let values: Vec<f64> = (0..2 * 500).map(|_| rng.gen::<f64>()).collect();
        let points = Matrix::new(2, 500, &values).unwrap();
        let serial = KmeansPlusPlus::default().choose(&points, 8).unwrap();
        let again = KmeansPlusPlus::default().choose(&points, 8).unwrap();
        let threaded = KmeansPlusPlus::new(KmeansPlusPlusConfig::default().with_num_threads(4))
            .choose(&points, 8)
            .unwrap();
        assert_eq!(serial, again);
        // Distance updates are element-wise, so the worker count cannot matter.
        assert_eq!(serial, threaded);
    }

    #[test]
    fn test_no_observations() {
        let values: Vec<f32> = Vec::new();
        let points = Matrix::new(2, 0, &values).unwrap();
        let mut centers = vec![3.0f32; 4];
        assert_eq!(
            KmeansPlusPlus::default().run(&points, 2, &mut centers, &mut []).unwrap(),
            0
        );
        assert_eq!(centers, vec![3.0; 4]);
    }
}
