//! Shared centroid and within-cluster sum of squares computations, plus the
//! shortcut for cluster counts that need no iterative refinement.

use log::{debug, warn};

use crate::details::{Details, Status};
use crate::matrix::{cast, column_mut, squared_distance, Matrix, Scalar};

/// Counts the observations assigned to each of `ncenters` clusters.
pub fn compute_sizes(ncenters: usize, clusters: &[usize]) -> Vec<usize> {
    let mut sizes = vec![0; ncenters];
    for &c in clusters {
        sizes[c] += 1;
    }
    sizes
}

/// Sets every non-empty cluster's centroid to the mean of its observations.
///
/// Centroids of clusters with a zero entry in `sizes` are left untouched.
pub fn compute_centroids<T: Scalar>(
    points: &Matrix<'_, T>,
    ncenters: usize,
    centers: &mut [T],
    clusters: &[usize],
    sizes: &[usize],
) {
    let ndim = points.ndim();
    for c in 0..ncenters {
        if sizes[c] > 0 {
            column_mut(centers, ndim, c).fill(T::zero());
        }
    }

    for (obs, &c) in clusters.iter().enumerate() {
        let center = column_mut(centers, ndim, c);
        for (x, &v) in center.iter_mut().zip(points.column(obs)) {
            *x = *x + v;
        }
    }

    for c in 0..ncenters {
        if sizes[c] > 0 {
            let n: T = cast(sizes[c]);
            for x in column_mut(centers, ndim, c) {
                *x = *x / n;
            }
        }
    }
}

/// Within-cluster sum of squares for each of `ncenters` clusters.
pub fn compute_wcss<T: Scalar>(
    points: &Matrix<'_, T>,
    ncenters: usize,
    centers: &[T],
    clusters: &[usize],
) -> Vec<T> {
    let ndim = points.ndim();
    let mut wcss = vec![T::zero(); ncenters];
    for (obs, &c) in clusters.iter().enumerate() {
        let center = &centers[c * ndim..(c + 1) * ndim];
        wcss[c] = wcss[c] + squared_distance(points.column(obs), center);
    }
    wcss
}

/// Whether `ncenters` is trivial for `nobs` observations: at most one
/// center, or at least one center per observation.
pub fn is_edge_case(nobs: usize, ncenters: usize) -> bool {
    ncenters <= 1 || ncenters >= nobs
}

/// Resolves a trivial clustering directly, see [`is_edge_case`].
///
/// - One center: every observation goes to cluster 0.
/// - At least as many centers as observations: each observation is its own
///   cluster, and surplus clusters are empty. More centers than observations
///   is flagged with [`Status::InvalidCenterCount`].
/// - No centers: nothing is assigned and the status is
///   [`Status::InvalidCenterCount`].
pub fn process_edge_case<T: Scalar>(
    points: &Matrix<'_, T>,
    ncenters: usize,
    centers: &mut [T],
    clusters: &mut [usize],
) -> Details<T> {
    let nobs = points.ncols();
    if ncenters == 1 {
        debug!("single cluster requested, assigning all {} observations to it", nobs);
        clusters.fill(0);
        let sizes = vec![nobs];
        compute_centroids(points, 1, centers, clusters, &sizes);
        let wcss = compute_wcss(points, 1, centers, clusters);
        return Details::new(sizes, wcss, 0, Status::Converged);
    }

    if ncenters == 0 {
        warn!("no cluster centers requested");
        return Details::empty(0, Status::InvalidCenterCount);
    }

    // ncenters >= nobs: each observation is a center.
    for (obs, c) in clusters.iter_mut().enumerate() {
        *c = obs;
    }
    let mut sizes = vec![0; ncenters];
    sizes[..nobs].fill(1);
    compute_centroids(points, ncenters, centers, clusters, &sizes);
    let wcss = compute_wcss(points, ncenters, centers, clusters);

    let status = if ncenters > nobs {
        warn!(
            "requested {} centers for only {} observations",
            ncenters, nobs
        );
        Status::InvalidCenterCount
    } else {
        debug!("one center per observation, using singleton clusters");
        Status::Converged
    };
    Details::new(sizes, wcss, 0, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square() -> Vec<f64> {
        vec![0.0, 0.0, 2.0, 0.0, 0.0, 2.0, 2.0, 2.0]
    }

    #[test]
    fn test_centroids_are_means() {
        let data = square();
        let points = Matrix::new(2, 4, &data).unwrap();
        let clusters = vec![0, 0, 1, 1];
        let sizes = compute_sizes(2, &clusters);
        let mut centers = vec![9.0; 4];
        compute_centroids(&points, 2, &mut centers, &clusters, &sizes);
        assert_eq!(centers, vec![1.0, 0.0, 1.0, 2.0]);

        let wcss = compute_wcss(&points, 2, &centers, &clusters);
        assert_abs_diff_eq!(wcss[0], 2.0);
        assert_abs_diff_eq!(wcss[1], 2.0);
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let data = square();
        let points = Matrix::new(2, 4, &data).unwrap();
        let clusters = vec![0, 0, 0, 0];
        let sizes = compute_sizes(2, &clusters);
        let mut centers = vec![0.0, 0.0, 7.0, 8.0];
        compute_centroids(&points, 2, &mut centers, &clusters, &sizes);
        assert_eq!(centers, vec![1.0, 1.0, 7.0, 8.0]);
    }

    #[test]
    fn test_single_center() {
        let data = square();
        let points = Matrix::new(2, 4, &data).unwrap();
        let mut centers = vec![0.0; 2];
        let mut clusters = vec![5; 4];
        assert!(is_edge_case(4, 1));
        let details = process_edge_case(&points, 1, &mut centers, &mut clusters);
        assert_eq!(details.status, Status::Converged);
        assert_eq!(details.sizes, vec![4]);
        assert_eq!(clusters, vec![0; 4]);
        assert_eq!(centers, vec![1.0, 1.0]);
        assert_abs_diff_eq!(details.withinss[0], 8.0);
    }

    #[test]
    fn test_one_center_per_observation() {
        let data = square();
        let points = Matrix::new(2, 4, &data).unwrap();
        let mut centers = vec![0.0; 8];
        let mut clusters = vec![0; 4];
        let details = process_edge_case(&points, 4, &mut centers, &mut clusters);
        assert_eq!(details.status, Status::Converged);
        assert_eq!(clusters, vec![0, 1, 2, 3]);
        assert_eq!(centers, data);
        assert!(details.withinss.iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_too_many_centers() {
        let data = square();
        let points = Matrix::new(2, 4, &data).unwrap();
        let mut centers = vec![0.0; 12];
        let mut clusters = vec![0; 4];
        let details = process_edge_case(&points, 6, &mut centers, &mut clusters);
        assert_eq!(details.status, Status::InvalidCenterCount);
        assert_eq!(details.sizes, vec![1, 1, 1, 1, 0, 0]);
        assert_eq!(&centers[..8], &data[..]);
    }

    #[test]
    fn test_no_centers() {
        let data = square();
        let points = Matrix::new(2, 4, &data).unwrap();
        let details = process_edge_case(&points, 0, &mut [], &mut [0; 4]);
        assert_eq!(details.status, Status::InvalidCenterCount);
        assert!(details.sizes.is_empty());
    }
}
