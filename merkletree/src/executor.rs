//! Sequential or pooled execution of per-level work.
//!
//! Work inside one level is split into disjoint slots, so no two workers
//! ever write the same output. [`Executor::map_chunks`] and
//! [`Executor::for_each_chunk_mut`] return only after every worker finished,
//! which is the barrier between consecutive levels.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::Config;
use crate::def::WORKER_THREAD_PREFIX;
use crate::error::MerkleError;

/// Shared flag that rejects new work once cancelled.
///
/// Cancellation is observed between levels and at the start of every
/// top-level call; a level that is already being hashed always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Err(MerkleError::Cancelled)` once the token was cancelled.
    pub fn check(&self) -> Result<(), MerkleError> {
        if self.is_cancelled() {
            return Err(MerkleError::Cancelled);
        }
        Ok(())
    }
}

/// Runs per-level tasks on the calling thread or on a fixed-size pool.
pub enum Executor {
    Sequential,
    Pool(ThreadPool),
}

impl Executor {
    /// Creates the executor described by `config`.
    pub fn new(config: &Config) -> Result<Self, MerkleError> {
        match config.worker_count() {
            None => Ok(Executor::Sequential),
            Some(n) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("{}-{}", WORKER_THREAD_PREFIX, i))
                    .build()
                    .map_err(|e| {
                        MerkleError::Configuration(format!("failed to build worker pool: {}", e))
                    })?;
                Ok(Executor::Pool(pool))
            }
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Executor::Pool(_))
    }

    /// Number of workers, 1 for sequential execution.
    pub fn worker_count(&self) -> usize {
        match self {
            Executor::Sequential => 1,
            Executor::Pool(pool) => pool.current_num_threads(),
        }
    }

    /// Applies `f` to each chunk of `chunk_size` items and collects the
    /// results in order. Stops at the first error.
    pub fn map_chunks<T, R, F>(&self, items: &[T], chunk_size: usize, f: F) -> Result<Vec<R>, MerkleError>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &[T]) -> Result<R, MerkleError> + Sync + Send,
    {
        match self {
            Executor::Sequential => items
                .chunks(chunk_size)
                .enumerate()
                .map(|(i, chunk)| f(i, chunk))
                .collect(),
            Executor::Pool(pool) => pool.install(|| {
                items
                    .par_chunks(chunk_size)
                    .enumerate()
                    .map(|(i, chunk)| f(i, chunk))
                    .collect()
            }),
        }
    }

    /// Applies `f` to each mutable chunk of `chunk_size` items.
    pub fn for_each_chunk_mut<T, F>(&self, items: &mut [T], chunk_size: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        match self {
            Executor::Sequential => items
                .chunks_mut(chunk_size)
                .enumerate()
                .for_each(|(i, chunk)| f(i, chunk)),
            Executor::Pool(pool) => pool.install(|| {
                items
                    .par_chunks_mut(chunk_size)
                    .enumerate()
                    .for_each(|(i, chunk)| f(i, chunk))
            }),
        }
    }
}
