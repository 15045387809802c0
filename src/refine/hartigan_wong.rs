//! Hartigan-Wong refinement (algorithm AS 136, Hartigan and Wong, 1979).
//!
//! Observations are moved between clusters one at a time. The expensive
//! optimal-transfer stage checks every observation against every cluster
//! that changed recently (the "live set") and moves it wherever the
//! within-cluster sum of squares drops the most. The cheap quick-transfer
//! stage then only weighs each observation's current cluster against its
//! runner-up, repeating until nothing moves. Both stages account for how the
//! means shift when a point leaves or joins a cluster, which is why this
//! finds better optima than Lloyd's algorithm.
//!
//! The stages alternate until a full optimal-transfer sweep moves nothing.

use log::{debug, trace, warn};

use crate::centroids::{compute_centroids, compute_sizes, compute_wcss, is_edge_case, process_edge_case};
use crate::details::{Details, Status};
use crate::error::{Error, Result};
use crate::matrix::{cast, check_buffers, column, squared_distance, Matrix, Scalar};
use crate::parallel::Executor;
use crate::refine::Refine;

/// Stand-in for the infinite transfer cost of a singleton cluster.
const BIG: f64 = 1e30;

/// Quick-transfer steps allowed per observation.
const QUICK_TRANSFER_STEPS_PER_OBS: usize = 50;

/// Configuration for [`HartiganWong`].
#[derive(Debug, Clone)]
pub struct HartiganWongConfig {
    /// Maximum number of optimal-transfer/quick-transfer rounds.
    pub max_iterations: usize,
    /// Workers used to find each observation's two closest centroids.
    pub num_threads: usize,
}

impl Default for HartiganWongConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            num_threads: 1,
        }
    }
}

impl HartiganWongConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }
}

/// Hartigan-Wong refinement.
///
/// Status codes:
///
/// - [`Status::Converged`]
/// - [`Status::EmptyCluster`]: some starting centroid is nobody's closest,
///   detected before any transfer. Usually a sign of poor starting
///   centroids or duplicated points.
/// - [`Status::MaxIterationsReached`]
/// - [`Status::InvalidCenterCount`]: more centers than observations.
/// - [`Status::QuickTransferLimit`]: the quick-transfer stage used more than
///   `50 * nobs` steps.
#[derive(Debug, Clone, Default)]
pub struct HartiganWong {
    config: HartiganWongConfig,
}

impl HartiganWong {
    pub fn new(config: HartiganWongConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HartiganWongConfig {
        &self.config
    }
}

/// Step at which a cluster was last modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastUpdate {
    /// Never touched; distances to it must always be recomputed.
    Unset,
    /// Not modified since the last optimal-transfer stage.
    Unchanged,
    /// Modified at this step. Optimal-transfer steps count observations;
    /// quick-transfer steps are offset by `nobs`.
    At(usize),
}

impl LastUpdate {
    fn at_or_after(self, step: usize) -> bool {
        matches!(self, LastUpdate::At(s) if s >= step)
    }

    fn after(self, step: usize) -> bool {
        matches!(self, LastUpdate::At(s) if s > step)
    }
}

/// Whether cluster `cen` can be skipped as a destination for observation
/// `obs` currently in `l1` with runner-up `l2`.
///
/// When `l1` is outside the live set only live clusters are candidates.
/// AND binds tighter than OR here, exactly as in AS 136.
fn skip_destination(obs: usize, live_l1: usize, live_cen: usize, cen: usize, l1: usize, l2: usize) -> bool {
    (obs >= live_l1 && obs >= live_cen) || cen == l1 || cen == l2
}

/// Quick-transfer step budget for `nobs` observations.
fn quick_transfer_budget(nobs: usize) -> Result<usize> {
    nobs.checked_mul(QUICK_TRANSFER_STEPS_PER_OBS)
        .ok_or(Error::TooManyObservations(nobs))
}

/// Mutable state shared by the two transfer stages.
struct Workspace<'a, 'b, T> {
    points: Matrix<'a, T>,
    ncenters: usize,
    centers: &'b mut [T],
    /// Current cluster of each observation.
    ic1: &'b mut [usize],
    /// Cluster each observation is most likely to move to.
    ic2: Vec<usize>,
    /// Cluster sizes.
    nc: Vec<usize>,
    /// `n / (n - 1)` per cluster: scales the cost of removing a point.
    an1: Vec<T>,
    /// `n / (n + 1)` per cluster: scales the cost of adding a point.
    an2: Vec<T>,
    ncp: Vec<LastUpdate>,
    /// Cached removal cost of each observation from its cluster.
    d: Vec<T>,
    /// Whether the cluster changed during the last quick-transfer stage.
    itran: Vec<bool>,
    /// A cluster is live for observations below this value.
    live: Vec<usize>,
    /// Optimal-transfer steps since the last transfer of any kind.
    indx: usize,
}

impl<'a, 'b, T: Scalar> Workspace<'a, 'b, T> {
    fn new(points: Matrix<'a, T>, ncenters: usize, centers: &'b mut [T], clusters: &'b mut [usize]) -> Self {
        let nobs = points.ncols();
        Self {
            points,
            ncenters,
            centers,
            ic1: clusters,
            ic2: vec![0; nobs],
            nc: vec![0; ncenters],
            an1: vec![T::zero(); ncenters],
            an2: vec![T::zero(); ncenters],
            ncp: vec![LastUpdate::Unset; ncenters],
            d: vec![T::zero(); nobs],
            itran: vec![true; ncenters],
            live: vec![0; ncenters],
            indx: 0,
        }
    }

    fn nobs(&self) -> usize {
        self.points.ncols()
    }

    fn distance(&self, obs: usize, cen: usize) -> T {
        let ndim = self.points.ndim();
        squared_distance(self.points.column(obs), column(self.centers, ndim, cen))
    }

    /// Assigns every observation to its closest centroid, records the
    /// runner-up, and recomputes centroids and sizes. Returns false if some
    /// cluster ends up empty.
    fn seed(&mut self, executor: &Executor) -> Result<bool> {
        let nobs = self.nobs();
        let ndim = self.points.ndim();
        let ncenters = self.ncenters;
        let points = self.points;
        let centers: &[T] = self.centers;

        let mut closest = vec![(0usize, 1usize); nobs];
        executor.for_each_chunk(&mut closest, |_, start, chunk| {
            for (i, slot) in chunk.iter_mut().enumerate() {
                let x = points.column(start + i);
                let (mut best, mut second) = (0, 1);
                let mut best_dist = squared_distance(x, column(centers, ndim, best));
                let mut second_dist = squared_distance(x, column(centers, ndim, second));
                if best_dist > second_dist {
                    std::mem::swap(&mut best, &mut second);
                    std::mem::swap(&mut best_dist, &mut second_dist);
                }
                for cen in 2..ncenters {
                    let dist = squared_distance(x, column(centers, ndim, cen));
                    if dist < second_dist {
                        second_dist = dist;
                        second = cen;
                        if dist < best_dist {
                            std::mem::swap(&mut best_dist, &mut second_dist);
                            std::mem::swap(&mut best, &mut second);
                        }
                    }
                }
                *slot = (best, second);
            }
            Ok(())
        })?;

        for (obs, (best, second)) in closest.into_iter().enumerate() {
            self.ic1[obs] = best;
            self.ic2[obs] = second;
        }

        self.nc = compute_sizes(ncenters, self.ic1);
        compute_centroids(&self.points, ncenters, self.centers, self.ic1, &self.nc);
        if self.nc.contains(&0) {
            return Ok(false);
        }

        let big: T = cast(BIG);
        for cen in 0..ncenters {
            let num: T = cast(self.nc[cen]);
            self.an2[cen] = num / (num + T::one());
            self.an1[cen] = if num > T::one() { num / (num - T::one()) } else { big };
        }
        Ok(true)
    }

    /// One optimal-transfer sweep. Stops early, leaving `indx == nobs`, once
    /// `nobs` consecutive steps pass without any transfer.
    fn optimal_transfer(&mut self) {
        let nobs = self.nobs();

        // Clusters touched by the last quick-transfer stage stay live for
        // this whole sweep.
        for cen in 0..self.ncenters {
            if self.itran[cen] {
                self.live[cen] = nobs;
            }
        }

        for obs in 0..nobs {
            self.indx += 1;
            let l1 = self.ic1[obs];

            // A point that is alone in its cluster stays put.
            if self.nc[l1] != 1 {
                if self.ncp[l1] != LastUpdate::Unchanged {
                    self.d[obs] = self.distance(obs, l1) * self.an1[l1];
                }

                let ll = self.ic2[obs];
                let mut l2 = ll;
                let mut r2 = self.distance(obs, l2) * self.an2[l2];
                for cen in 0..self.ncenters {
                    if skip_destination(obs, self.live[l1], self.live[cen], cen, l1, ll) {
                        continue;
                    }
                    let rr = r2 / self.an2[cen];
                    let dc = self.distance(obs, cen);
                    if dc < rr {
                        r2 = dc * self.an2[cen];
                        l2 = cen;
                    }
                }

                if r2 >= self.d[obs] {
                    self.ic2[obs] = l2;
                } else {
                    self.indx = 0;
                    self.live[l1] = nobs + obs;
                    self.live[l2] = nobs + obs;
                    self.ncp[l1] = LastUpdate::At(obs);
                    self.ncp[l2] = LastUpdate::At(obs);
                    self.transfer_point(obs, l1, l2);
                }
            }

            if self.indx == nobs {
                return;
            }
        }

        // Shift the live marks back by one sweep; anything at or below zero
        // is equally stale.
        for cen in 0..self.ncenters {
            self.itran[cen] = false;
            self.live[cen] = self.live[cen].saturating_sub(nobs);
        }
    }

    /// Quick-transfer sweeps until `nobs` consecutive steps pass without a
    /// transfer. Returns false if `max_steps` is reached first.
    fn quick_transfer(&mut self, max_steps: usize) -> bool {
        let nobs = self.nobs();
        let mut icoun = 0;
        let mut istep = 0;

        loop {
            for obs in 0..nobs {
                icoun += 1;
                let l1 = self.ic1[obs];

                if self.nc[l1] != 1 {
                    // Only recompute if L1 changed within the last nobs steps.
                    if self.ncp[l1].at_or_after(istep) {
                        self.d[obs] = self.distance(obs, l1) * self.an1[l1];
                    }

                    // If neither cluster changed recently there is nothing new to check.
                    let l2 = self.ic2[obs];
                    if (self.ncp[l1].after(istep) || self.ncp[l2].after(istep))
                        && self.distance(obs, l2) < self.d[obs] / self.an2[l2]
                    {
                        icoun = 0;
                        self.indx = 0;
                        self.itran[l1] = true;
                        self.itran[l2] = true;
                        self.ncp[l1] = LastUpdate::At(istep + nobs);
                        self.ncp[l2] = LastUpdate::At(istep + nobs);
                        self.transfer_point(obs, l1, l2);
                    }
                }

                if icoun == nobs {
                    return true;
                }

                istep += 1;
                if istep >= max_steps {
                    return false;
                }
            }
        }
    }

    /// Alternates the two transfer stages. Returns the iteration count, one
    /// more than `max_iterations` if the budget ran out, and the status.
    fn iterate(&mut self, max_iterations: usize, max_quick_steps: usize) -> (usize, Status) {
        let nobs = self.nobs();
        let mut status = Status::Converged;
        let mut iter = 1;
        while iter <= max_iterations {
            self.optimal_transfer();
            if self.indx == nobs {
                break;
            }

            if !self.quick_transfer(max_quick_steps) {
                warn!(
                    "Hartigan-Wong exceeded {} quick-transfer steps",
                    max_quick_steps
                );
                status = Status::QuickTransferLimit;
                break;
            }
            trace!("Hartigan-Wong iteration {} finished", iter);

            // With two clusters another optimal-transfer sweep cannot help.
            if self.ncenters == 2 {
                break;
            }

            self.ncp.fill(LastUpdate::Unchanged);
            iter += 1;
        }

        if iter > max_iterations {
            warn!(
                "Hartigan-Wong did not converge within {} iterations",
                max_iterations
            );
            status = Status::MaxIterationsReached;
        } else if status == Status::Converged {
            debug!("Hartigan-Wong converged after {} iterations", iter);
        }
        (iter, status)
    }

    /// Moves `obs` from `l1` to `l2`, updating both means in place.
    fn transfer_point(&mut self, obs: usize, l1: usize, l2: usize) {
        let ndim = self.points.ndim();
        let al1: T = cast(self.nc[l1]);
        let alw = al1 - T::one();
        let al2: T = cast(self.nc[l2]);
        let alt = al2 + T::one();

        let x = self.points.column(obs);
        let (off1, off2) = (l1 * ndim, l2 * ndim);
        for (d, &v) in x.iter().enumerate() {
            self.centers[off1 + d] = (self.centers[off1 + d] * al1 - v) / alw;
            self.centers[off2 + d] = (self.centers[off2 + d] * al2 + v) / alt;
        }

        self.nc[l1] -= 1;
        self.nc[l2] += 1;

        self.an2[l1] = alw / al1;
        self.an1[l1] = if alw > T::one() { alw / (alw - T::one()) } else { cast(BIG) };
        self.an1[l2] = alt / al2;
        self.an2[l2] = alt / (alt + T::one());

        self.ic1[obs] = l2;
        self.ic2[obs] = l1;
    }
}

impl<T: Scalar> Refine<T> for HartiganWong {
    fn run(
        &self,
        points: &Matrix<'_, T>,
        ncenters: usize,
        centers: &mut [T],
        clusters: &mut [usize],
    ) -> Result<Details<T>> {
        check_buffers(points, ncenters, centers, clusters)?;
        let nobs = points.ncols();
        let max_quick_steps = quick_transfer_budget(nobs)?;
        if is_edge_case(nobs, ncenters) {
            return Ok(process_edge_case(points, ncenters, centers, clusters));
        }

        let executor = Executor::new(self.config.num_threads)?;
        let mut ws = Workspace::new(*points, ncenters, centers, clusters);
        if !ws.seed(&executor)? {
            warn!("Hartigan-Wong found an empty cluster in the starting assignment");
            let sizes = ws.nc.clone();
            let wcss = compute_wcss(points, ncenters, ws.centers, ws.ic1);
            return Ok(Details::new(sizes, wcss, 0, Status::EmptyCluster));
        }

        let (iter, status) = ws.iterate(self.config.max_iterations, max_quick_steps);

        // Recompute exactly to shed the drift of the incremental updates.
        compute_centroids(points, ncenters, ws.centers, ws.ic1, &ws.nc);
        let wcss = compute_wcss(points, ncenters, ws.centers, ws.ic1);
        Ok(Details::new(ws.nc, wcss, iter, status))
    }
}
