//! Concurrency helpers: a bounded batch executor and a dispatch-rate limiter that wraps it.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Runs a batch of independent tasks and returns their results in submission order.
///
/// A failing task yields an `Err` in its own slot; siblings always run to completion.
pub trait Executor: Send + Sync {
    fn run_batch<T, F>(&self, tasks: Vec<F>) -> Vec<Result<T>>
    where
        T: Send,
        F: FnOnce() -> Result<T> + Send;
}

/// Bounded worker pool backed by a dedicated rayon pool (at most `workers` tasks in flight).
pub struct PoolExecutor {
    pool: Option<ThreadPool>,
    workers: usize,
}

impl PoolExecutor {
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        // One worker needs no pool: tasks run inline on the caller's thread.
        let pool = if workers > 1 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("magpie-worker-{}", i))
                    .build()
                    .context("build worker pool")?,
            )
        } else {
            None
        };
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Executor for PoolExecutor {
    fn run_batch<T, F>(&self, tasks: Vec<F>) -> Vec<Result<T>>
    where
        T: Send,
        F: FnOnce() -> Result<T> + Send,
    {
        match &self.pool {
            None => tasks.into_iter().map(|task| task()).collect(),
            Some(pool) => pool.install(|| tasks.into_par_iter().map(|task| task()).collect()),
        }
    }
}

/// Enforces a minimum wall-clock interval between successive dispatches.
///
/// Slots are reserved under the lock and slept outside it, so concurrent callers
/// queue up one interval apart instead of all waking at once.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// `requests_per_second <= 0` (or non-finite) disables limiting.
    pub fn per_second(requests_per_second: f64) -> Self {
        let interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };
        Self { interval, last: Mutex::new(None) }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until at least `interval` has passed since the previous dispatch.
    /// Returns how long the caller waited.
    pub fn acquire(&self) -> Duration {
        if self.interval.is_zero() {
            return Duration::ZERO;
        }
        let now = Instant::now();
        let slot = {
            let mut last = self.last.lock();
            let slot = match *last {
                Some(prev) if prev + self.interval > now => prev + self.interval,
                _ => now,
            };
            *last = Some(slot);
            slot
        };
        let wait = slot.saturating_duration_since(now);
        if !wait.is_zero() {
            sleep(wait);
        }
        wait
    }
}

/// Composition of an [`Executor`] with a [`RateLimiter`]: the limit applies per batch,
/// so a batch of `W` tasks may burst `W` requests inside one interval.
pub struct RateLimited<E> {
    inner: E,
    limiter: RateLimiter,
}

impl<E: Executor> RateLimited<E> {
    pub fn new(inner: E, limiter: RateLimiter) -> Self {
        Self { inner, limiter }
    }
}

impl<E: Executor> Executor for RateLimited<E> {
    fn run_batch<T, F>(&self, tasks: Vec<F>) -> Vec<Result<T>>
    where
        T: Send,
        F: FnOnce() -> Result<T> + Send,
    {
        let waited = self.limiter.acquire();
        if !waited.is_zero() {
            tracing::trace!(waited_ms = waited.as_millis() as u64, "rate limiter delayed batch");
        }
        self.inner.run_batch(tasks)
    }
}
