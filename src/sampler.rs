//! Neighbor sampling: qualifying stories near a seed ID, found by widening ID windows.

use crate::concurrency::Executor;
use crate::fetcher::ItemFetcher;
use crate::item::RemoteItem;
use anyhow::{Context, Result};

/// Outcome of one [`NeighborSampler::sample`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborSample {
    pub items: Vec<RemoteItem>,
    /// Windows fetched.
    pub rounds: usize,
    /// True when the search stopped before reaching the requested count
    /// (round budget spent, or the window slid below ID 1).
    pub exhausted: bool,
}

/// Finds up to `count` qualifying stories around a seed ID.
///
/// Round `k` scans `[s_k - 2c, s_k + 2c)` where `s_0` is the seed and `s_{k+1} = s_k - 4c`,
/// so every round searches further left than the last.
pub struct NeighborSampler<'a, E> {
    fetcher: &'a ItemFetcher,
    executor: &'a E,
    min_score: i64,
    max_rounds: usize,
}

impl<'a, E: Executor> NeighborSampler<'a, E> {
    pub fn new(fetcher: &'a ItemFetcher, executor: &'a E) -> Self {
        Self { fetcher, executor, min_score: 3, max_rounds: 64 }
    }

    pub fn min_score(mut self, min_score: i64) -> Self { self.min_score = min_score; self }
    pub fn max_rounds(mut self, rounds: usize) -> Self { self.max_rounds = rounds.max(1); self }

    pub fn sample(&self, start_id: u64, count: usize) -> Result<NeighborSample> {
        if count == 0 {
            return Ok(NeighborSample { items: Vec::new(), rounds: 0, exhausted: false });
        }
        let start = i64::try_from(start_id)
            .with_context(|| format!("seed id {} is out of range", start_id))?;
        self.collect(start, count, Vec::with_capacity(count), 0)
    }

    fn collect(
        &self,
        start: i64,
        count: usize,
        mut acc: Vec<RemoteItem>,
        rounds: usize,
    ) -> Result<NeighborSample> {
        let span = 2 * count as i64;
        let lo = (start - span).max(1);
        let hi = start.saturating_add(span);
        if hi <= lo {
            tracing::warn!(start, count, found = acc.len(), rounds, "window below first item id; giving up");
            return Ok(NeighborSample { items: acc, rounds, exhausted: true });
        }

        let fetcher = self.fetcher;
        let tasks: Vec<_> = (lo..hi)
            .map(|id| move || fetcher.fetch(id as u64))
            .collect();
        let results = self.executor.run_batch(tasks);
        let rounds = rounds + 1;

        // Siblings already ran (and cached); now surface the first failure.
        let mut fetched = Vec::with_capacity(results.len());
        for res in results {
            fetched.push(res?);
        }

        for item in fetched.into_iter().flatten() {
            if acc.len() >= count {
                break;
            }
            if item.qualifies(self.min_score) {
                acc.push(item);
            }
        }
        tracing::debug!(start, lo, hi, rounds, found = acc.len(), count, "neighbor window scanned");

        if acc.len() >= count {
            return Ok(NeighborSample { items: acc, rounds, exhausted: false });
        }
        if rounds >= self.max_rounds {
            tracing::warn!(start, count, found = acc.len(), rounds, "neighbor search hit round limit");
            return Ok(NeighborSample { items: acc, rounds, exhausted: true });
        }
        self.collect(start - 2 * span, count, acc, rounds)
    }
}
