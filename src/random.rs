//! Seeded sampling primitives used by the initializers and mini-batch.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::StandardNormal;

use crate::matrix::{cast, Scalar};

/// Random engine used throughout the crate.
pub type Engine = ChaCha20Rng;

/// Creates a deterministic engine from `seed`.
pub fn engine(seed: u64) -> Engine {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Uniform draw from `[0, 1)`.
pub fn standard_uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// Two independent standard normal draws.
pub fn standard_normal_pair<R: Rng + ?Sized>(rng: &mut R) -> (f64, f64) {
    (rng.sample(StandardNormal), rng.sample(StandardNormal))
}

/// Draws an integer from `[0, bound)` by reducing a raw 64-bit word.
///
/// Not exactly uniform, but stable across platforms and library versions,
/// which is what the vantage-point tree needs.
pub fn discrete_uniform<R: Rng + ?Sized>(rng: &mut R, bound: usize) -> usize {
    (rng.next_u64() % bound as u64) as usize
}

/// Chooses `choose` distinct indices from `0..population`, in increasing order.
///
/// Uses selection sampling: each index is included with probability
/// `(still needed) / (still available)`. If `choose >= population` every index
/// is returned.
pub fn sample_without_replacement<R: Rng + ?Sized>(
    population: usize,
    choose: usize,
    rng: &mut R,
) -> Vec<usize> {
    if choose >= population {
        return (0..population).collect();
    }

    let mut chosen = Vec::with_capacity(choose);
    let mut traversed = 0;
    while chosen.len() < choose {
        let needed = (choose - chosen.len()) as f64;
        let available = (population - traversed) as f64;
        if needed > available * standard_uniform(rng) {
            chosen.push(traversed);
        }
        traversed += 1;
    }
    chosen
}

/// Picks an index with probability proportional to `weights`, given their
/// running sum in `cumulative`.
///
/// Indices with zero weight are never returned; the draw is repeated if one
/// is hit through ties or rounding. At least one weight must be positive.
pub fn weighted_sample<T: Scalar, R: Rng + ?Sized>(
    cumulative: &[T],
    weights: &[T],
    rng: &mut R,
) -> usize {
    let total = match cumulative.last() {
        Some(&total) => total,
        None => return 0,
    };

    loop {
        let sampled = total * cast::<T, _>(standard_uniform(rng));
        let chosen = cumulative.partition_point(|&c| c < sampled);
        if chosen < weights.len() && weights[chosen] != T::zero() {
            return chosen;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_without_replacement_is_sorted_and_distinct() {
        let mut rng = engine(42);
        let chosen = sample_without_replacement(100, 10, &mut rng);
        assert_eq!(chosen.len(), 10);
        assert!(chosen.windows(2).all(|w| w[0] < w[1]));
        assert!(chosen.iter().all(|&x| x < 100));
    }

    #[test]
    fn test_sample_everything() {
        let mut rng = engine(1);
        assert_eq!(sample_without_replacement(5, 7, &mut rng), vec![0, 1, 2, 3, 4]);
        assert!(sample_without_replacement(0, 3, &mut rng).is_empty());
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let a = sample_without_replacement(1000, 20, &mut engine(7));
        let b = sample_without_replacement(1000, 20, &mut engine(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_weighted_sample_skips_zero_weights() {
        let weights = vec![0.0, 0.0, 3.0, 0.0, 1.0];
        let mut cumulative = weights.clone();
        for i in 1..cumulative.len() {
            cumulative[i] += cumulative[i - 1];
        }
        let mut rng = engine(99);
        let mut hits = [0usize; 5];
        for _ in 0..2000 {
            hits[weighted_sample(&cumulative, &weights, &mut rng)] += 1;
        }
        assert_eq!(hits[0] + hits[1] + hits[3], 0);
        // Roughly 3:1 in favour of index 2.
        assert!(hits[2] > 2 * hits[4]);
    }

    #[test]
    fn test_discrete_uniform_in_bounds() {
        let mut rng = engine(3);
        for bound in 1..20 {
            assert!(discrete_uniform(&mut rng, bound) < bound);
        }
    }
}
