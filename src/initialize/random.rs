use log::debug;

use crate::error::Result;
use crate::initialize::{copy_into_centers, Initialize};
use crate::matrix::{check_buffers, Matrix, Scalar};
use crate::random::{engine, sample_without_replacement};

/// Configuration for [`RandomSample`].
#[derive(Debug, Clone)]
pub struct RandomConfig {
    /// Seed for the sampling engine.
    pub seed: u64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self { seed: 6523 }
    }
}

impl RandomConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Uses randomly chosen observations, without replacement, as the starting
/// centroids.
#[derive(Debug, Clone, Default)]
pub struct RandomSample {
    config: RandomConfig,
}

impl RandomSample {
    pub fn new(config: RandomConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RandomConfig {
        &self.config
    }
}

impl<T: Scalar> Initialize<T> for RandomSample {
    fn run(
        &self,
        points: &Matrix<'_, T>,
        ncenters: usize,
        centers: &mut [T],
        clusters: &mut [usize],
    ) -> Result<usize> {
        check_buffers(points, ncenters, centers, clusters)?;
        let mut rng = engine(self.config.seed);
        let chosen = sample_without_replacement(points.ncols(), ncenters, &mut rng);
        copy_into_centers(points, &chosen, centers);
        if chosen.len() < ncenters {
            debug!(
                "only {} observations available for {} centers",
                chosen.len(),
                ncenters
            );
        }
        Ok(chosen.len())
    }
}
