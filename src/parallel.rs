//! Fork-join execution of per-observation work.
//!
//! Every parallel section in this crate writes only to its own slot of an
//! output buffer, so the work is expressed as "fill this slice": the slice is
//! cut into contiguous chunks, one per worker, and each worker receives the
//! index of its first element alongside the chunk.

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

/// Runs chunked work on a fixed number of workers.
pub struct Executor {
    num_threads: usize,
    pool: Option<ThreadPool>,
}

impl Executor {
    /// Creates an executor with `num_threads` workers. Zero is treated as one,
    /// and a single worker runs everything on the calling thread.
    pub fn new(num_threads: usize) -> Result<Self> {
        let num_threads = num_threads.max(1);
        let pool = if num_threads > 1 {
            Some(ThreadPoolBuilder::new().num_threads(num_threads).build()?)
        } else {
            None
        };
        Ok(Self { num_threads, pool })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Calls `body(worker, start, chunk)` for contiguous chunks of `output`.
    ///
    /// No more workers than elements are used. All workers are joined before
    /// returning; if any of them failed, the error of the lowest-numbered
    /// failing worker is returned. Panics are re-raised after the join.
    pub fn for_each_chunk<U, F>(&self, output: &mut [U], body: F) -> Result<()>
    where
        U: Send,
        F: Fn(usize, usize, &mut [U]) -> Result<()> + Sync,
    {
        let ntasks = output.len();
        if ntasks == 0 {
            return Ok(());
        }

        let workers = self.num_threads.min(ntasks);
        let pool = match &self.pool {
            Some(pool) if workers > 1 => pool,
            _ => return body(0, 0, output),
        };

        let chunk_size = ntasks.div_ceil(workers);
        let mut outcomes: Vec<Result<()>> = (0..workers).map(|_| Ok(())).collect();
        let body = &body;
        pool.scope(|scope| {
            for (worker, (chunk, outcome)) in output
                .chunks_mut(chunk_size)
                .zip(outcomes.iter_mut())
                .enumerate()
            {
                scope.spawn(move |_| {
                    *outcome = body(worker, worker * chunk_size, chunk);
                });
            }
        });

        outcomes.into_iter().collect()
    }
}
