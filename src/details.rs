/// How a refinement run ended.
///
/// The integer codes are stable and match the conventional k-means status
/// values; not every refiner can produce every status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Completed without problems.
    Converged = 0,
    /// At least one cluster ended up without observations. For Hartigan-Wong
    /// this is detected before any transfers and stops the run; it usually
    /// points at a poor choice of starting centroids or duplicated points.
    EmptyCluster = 1,
    /// The iteration budget ran out before convergence.
    MaxIterationsReached = 2,
    /// The number of centers is zero or exceeds the number of observations.
    InvalidCenterCount = 3,
    /// Hartigan-Wong exceeded its quick-transfer step budget.
    QuickTransferLimit = 4,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_converged(self) -> bool {
        self == Status::Converged
    }
}

/// Statistics produced by a refinement run.
#[derive(Debug, Clone, PartialEq)]
pub struct Details<T> {
    /// Number of observations in each cluster, ordered by cluster id.
    pub sizes: Vec<usize>,
    /// Within-cluster sum of squares for each cluster.
    pub withinss: Vec<T>,
    /// Iterations used. When the budget is exhausted this is one more than
    /// the configured maximum.
    pub iterations: usize,
    pub status: Status,
}

impl<T> Details<T> {
    pub fn new(sizes: Vec<usize>, withinss: Vec<T>, iterations: usize, status: Status) -> Self {
        Self {
            sizes,
            withinss,
            iterations,
            status,
        }
    }

    /// A report with no per-cluster statistics.
    pub fn empty(iterations: usize, status: Status) -> Self {
        Self::new(Vec::new(), Vec::new(), iterations, status)
    }
}
