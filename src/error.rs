use thiserror::Error;

/// Errors raised before any clustering work starts.
///
/// Algorithmic outcomes (non-convergence, empty clusters) are not errors; they
/// are reported through [`crate::Status`] on the returned [`crate::Details`].
#[derive(Debug, Error)]
pub enum Error {
    /// Observations and centers must have at least one dimension.
    #[error("number of dimensions must be positive")]
    ZeroDimensions,

    /// A caller-supplied buffer does not match the shape it is used with.
    #[error("expected {expected} values in the {name} buffer, found {found}")]
    BufferLength {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    /// No cluster centers were requested.
    #[error("number of cluster centers must be positive")]
    NoCenters,

    /// The point set has no observations.
    #[error("no observations supplied")]
    EmptyInput,

    /// The quick-transfer step budget (`50 * nobs`) does not fit in `usize`.
    #[error("too many observations ({0}) for the quick-transfer step counter")]
    TooManyObservations(usize),

    #[error("failed to build the worker thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A worker in a parallel section reported a failure.
    ///
    /// The built-in strategies never fail inside workers; this is for bodies
    /// passed to [`crate::parallel::Executor::for_each_chunk`] by callers.
    #[error("worker {worker} failed: {message}")]
    Worker { worker: usize, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
