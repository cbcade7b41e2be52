use crate::assemble::{assemble, filter_neighbors, SplitCfg, SplitDataset};
use crate::cache::FsCache;
use crate::concurrency::{Executor, PoolExecutor, RateLimited, RateLimiter};
use crate::config::MagpieOptions;
use crate::date::{DateParser, RelativeAgeParser};
use crate::fetcher::ItemFetcher;
use crate::html::{ListingPageParser, PageParser};
use crate::item::UpvoteRecord;
use crate::ndjson::ExportFormat;
use crate::progress::maybe_count_progress;
use crate::sampler::{NeighborSample, NeighborSampler};
use crate::scrape::UpvoteScraper;
use crate::sink::DatasetSink;
use crate::transport::{HttpTransport, Transport};
use crate::util::init_tracing_once;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Orchestrates scrape → neighbor sampling → dedupe → assembly → sink.
///
/// Collaborators (transport, page parser, date parser) are injected; the cache is
/// constructed from the options on demand, so no state is shared between instances.
#[derive(Clone)]
pub struct Magpie {
    pub(crate) opts: MagpieOptions,
    transport: Arc<dyn Transport>,
    parser: Arc<dyn PageParser>,
    dates: Arc<dyn DateParser>,
}

impl Magpie {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            opts: MagpieOptions::default(),
            transport,
            parser: Arc::new(ListingPageParser::new()),
            dates: Arc::new(RelativeAgeParser),
        }
    }

    /// Build with a live HTTP transport honoring `opts.http_timeout`.
    pub fn http(opts: MagpieOptions) -> Result<Self> {
        let transport = HttpTransport::new(opts.http_timeout)?;
        Ok(Self::new(Arc::new(transport)).options(opts))
    }

    // -------- Builder methods --------
    pub fn options(mut self, opts: MagpieOptions) -> Self { self.opts = opts; self }
    pub fn page_parser(mut self, parser: Arc<dyn PageParser>) -> Self { self.parser = parser; self }
    pub fn date_parser(mut self, dates: Arc<dyn DateParser>) -> Self { self.dates = dates; self }
    pub fn cache_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_cache_dir(dir); self }
    pub fn lifetimes(mut self, item: Duration, upvotes: Duration) -> Self { self.opts = self.opts.with_lifetimes(item, upvotes); self }
    pub fn workers(mut self, n: usize) -> Self { self.opts = self.opts.with_workers(n); self }
    pub fn requests_per_second(mut self, rps: f64) -> Self { self.opts = self.opts.with_requests_per_second(rps); self }
    pub fn outer_workers(mut self, n: usize) -> Self { self.opts = self.opts.with_outer_workers(n); self }
    pub fn page_delay(mut self, delay: Duration) -> Self { self.opts = self.opts.with_page_delay(delay); self }
    pub fn min_score(mut self, score: i64) -> Self { self.opts = self.opts.with_min_score(score); self }
    pub fn neighbors_per_upvote(mut self, n: usize) -> Self { self.opts = self.opts.with_neighbors_per_upvote(n); self }
    pub fn max_rounds(mut self, n: usize) -> Self { self.opts = self.opts.with_max_rounds(n); self }
    pub fn endpoints(mut self, listing: impl Into<String>, item: impl Into<String>) -> Self { self.opts = self.opts.with_endpoints(listing, item); self }
    pub fn out_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_out_dir(dir); self }
    pub fn destination(mut self, dest: impl Into<String>) -> Self { self.opts = self.opts.with_destination(dest); self }
    pub fn format(mut self, format: ExportFormat) -> Self { self.opts = self.opts.with_format(format); self }
    pub fn split(mut self, split: SplitCfg) -> Self { self.opts = self.opts.with_split(split); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }

    pub fn opts(&self) -> &MagpieOptions {
        &self.opts
    }

    pub fn cache(&self) -> FsCache {
        FsCache::new(&self.opts.cache_dir)
    }

    pub fn clear_cache(&self) -> Result<()> {
        tracing::info!(dir = %self.opts.cache_dir.display(), "clearing cache");
        self.cache().clear()
    }

    pub fn fetcher(&self) -> ItemFetcher {
        ItemFetcher::new(self.cache(), self.transport.clone(), self.opts.item_base.clone(), self.opts.item_lifetime)
    }

    /// Positive examples: every upvoted story of `username`.
    pub fn upvotes(&self, username: &str, token: &str) -> Result<Vec<UpvoteRecord>> {
        UpvoteScraper::new(
            self.cache(),
            self.transport.clone(),
            self.parser.clone(),
            self.dates.clone(),
            self.opts.listing_base.clone(),
        )
        .lifetime(self.opts.upvote_lifetime)
        .page_delay(self.opts.page_delay)
        .download(username, token)
        .with_context(|| format!("download upvotes of {}", username))
    }

    /// One neighbor sample per upvote, in upvote order.
    ///
    /// Upvotes are spread over `outer_workers` threads; each sampler round fans out to
    /// `workers` fetch threads behind one shared rate limiter.
    pub fn neighbors(&self, upvotes: &[UpvoteRecord]) -> Result<Vec<NeighborSample>> {
        let fetcher = self.fetcher();
        let inner = RateLimited::new(
            PoolExecutor::new(self.opts.workers)?,
            RateLimiter::per_second(self.opts.requests_per_second),
        );
        let sampler = NeighborSampler::new(&fetcher, &inner)
            .min_score(self.opts.min_score)
            .max_rounds(self.opts.max_rounds);
        let outer = PoolExecutor::new(self.opts.outer_workers)?;

        let count = self.opts.neighbors_per_upvote;
        let pb = maybe_count_progress(self.opts.progress, upvotes.len() as u64, "Neighbors");
        let sampler = &sampler;
        let pb_ref = &pb;
        let tasks: Vec<_> = upvotes
            .iter()
            .map(|u| {
                move || {
                    let res = sampler
                        .sample(u.id, count)
                        .with_context(|| format!("sample neighbors of {}", u.id));
                    pb_ref.inc(1);
                    res
                }
            })
            .collect();

        let samples = outer.run_batch(tasks).into_iter().collect::<Result<Vec<_>>>()?;
        pb.finish_with_message("neighbors collected");

        let short = samples.iter().filter(|s| s.exhausted).count();
        if short > 0 {
            tracing::warn!(short, total = samples.len(), "some upvotes got fewer neighbors than requested");
        }
        Ok(samples)
    }

    /// Scrape, sample, dedupe, assemble. Nothing is published.
    pub fn build_dataset(&self, username: &str, token: &str) -> Result<SplitDataset> {
        init_tracing_once();
        std::fs::create_dir_all(&self.opts.cache_dir)
            .with_context(|| format!("create {}", self.opts.cache_dir.display()))?;

        let upvotes = self.upvotes(username, token)?;
        tracing::info!(count = upvotes.len(), "fetching neighbor stories (using cache when available)");
        let samples = self.neighbors(&upvotes)?;

        let neighbors = filter_neighbors(&upvotes, samples.into_iter().map(|s| s.items));
        let dataset = assemble(&upvotes, &neighbors, &self.opts.split);
        tracing::debug!(entries = self.cache().entry_count(), "cache size after run");
        Ok(dataset)
    }

    /// Full run: build the dataset and hand it to `sink` under the configured destination.
    pub fn run(&self, username: &str, token: &str, sink: &dyn DatasetSink) -> Result<SplitDataset> {
        let dataset = self.build_dataset(username, token)?;
        sink.publish(&dataset, &self.opts.destination)
            .with_context(|| format!("publish dataset to {}", self.opts.destination))?;
        Ok(dataset)
    }
}
