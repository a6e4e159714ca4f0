//! Rayon thread pool sizing for search workers.
//!
//! The worker count is the number of islands or shards a search is split into; each runs
//! on its own pool thread.

use std::num::NonZeroUsize;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::SearchError;

/// Default upper bound on workers when nothing else is configured.
pub const DEFAULT_MAX_WORKERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, one per logical CPU.
    pub workers: usize,
    /// Hard cap applied to both requested and detected counts.
    pub max_workers: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self {
            workers: 0,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl WorkerPool {
    /// One worker per logical CPU, capped at `max_workers`.
    pub fn default_workers(max_workers: usize) -> Self {
        Self {
            workers: 0,
            max_workers,
        }
    }

    /// Exactly `n` workers, still capped at `max_workers`.
    pub fn with_workers(n: usize, max_workers: usize) -> Self {
        Self {
            workers: n,
            max_workers,
        }
    }

    /// Effective worker count, always at least 1.
    pub fn worker_count(&self) -> usize {
        let requested = if self.workers == 0 {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            self.workers
        };
        requested.min(self.max_workers).max(1)
    }

    /// Builds a dedicated pool with [`worker_count`](WorkerPool::worker_count) threads.
    pub fn build(&self) -> Result<ThreadPool, SearchError> {
        ThreadPoolBuilder::new()
            .num_threads(self.worker_count())
            .thread_name(|index| format!("tactician-worker-{index}"))
            .build()
            .map_err(|err| SearchError::InvalidConfig(format!("failed to start worker pool: {err}")))
    }
}
