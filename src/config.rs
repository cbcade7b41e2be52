use crate::assemble::SplitCfg;
use crate::ndjson::ExportFormat;
use crate::util::env_parse;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the site session token.
pub const COOKIE_ENV: &str = "HN_USER_COOKIE";

/// Read the session token from [`COOKIE_ENV`]; absent or blank is an error.
pub fn credential_from_env() -> Result<String> {
    match std::env::var(COOKIE_ENV) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(anyhow!("Need to find and set the hackernews cookie as {} env var", COOKIE_ENV)),
    }
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct MagpieOptions {
    pub cache_dir: PathBuf,
    pub item_lifetime: Duration,
    pub upvote_lifetime: Duration,

    // fetch concurrency
    pub workers: usize,             // in-flight item fetches per sampler batch
    pub requests_per_second: f64,   // batch dispatch rate; <= 0 disables the limiter
    pub outer_workers: usize,       // upvotes sampled concurrently
    pub page_delay: Duration,       // fixed pause between listing pages
    pub http_timeout: Duration,

    // sampling
    pub min_score: i64,
    pub neighbors_per_upvote: usize,
    pub max_rounds: usize,

    // endpoints
    pub listing_base: String,
    pub item_base: String,

    // output
    pub out_dir: PathBuf,
    pub destination: String,
    pub format: ExportFormat,
    pub split: SplitCfg,
    pub progress: bool,
}

impl Default for MagpieOptions {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache"),
            item_lifetime: Duration::from_secs(24 * 3600),
            upvote_lifetime: Duration::from_secs(24 * 3600),

            workers: 10,
            requests_per_second: 10.0,
            outer_workers: 5,
            page_delay: Duration::from_secs(1),
            http_timeout: Duration::from_secs(30),

            min_score: 3,
            neighbors_per_upvote: 1,
            max_rounds: 64,

            listing_base: "https://news.ycombinator.com".to_string(),
            item_base: "https://hacker-news.firebaseio.com/v0".to_string(),

            out_dir: PathBuf::from("./dataset"),
            destination: "hn-upvote-data".to_string(),
            format: ExportFormat::Jsonl,
            split: SplitCfg::default(),
            progress: true,
        }
    }
}

impl MagpieOptions {
    pub fn with_cache_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cache_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_lifetimes(mut self, item: Duration, upvotes: Duration) -> Self {
        self.item_lifetime = item;
        self.upvote_lifetime = upvotes;
        self
    }
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n.max(1);
        self
    }
    pub fn with_requests_per_second(mut self, rps: f64) -> Self {
        self.requests_per_second = rps;
        self
    }
    pub fn with_outer_workers(mut self, n: usize) -> Self {
        self.outer_workers = n.max(1);
        self
    }
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
    pub fn with_min_score(mut self, score: i64) -> Self {
        self.min_score = score;
        self
    }
    pub fn with_neighbors_per_upvote(mut self, n: usize) -> Self {
        self.neighbors_per_upvote = n;
        self
    }
    pub fn with_max_rounds(mut self, n: usize) -> Self {
        self.max_rounds = n.max(1);
        self
    }
    pub fn with_endpoints(mut self, listing_base: impl Into<String>, item_base: impl Into<String>) -> Self {
        self.listing_base = listing_base.into();
        self.item_base = item_base.into();
        self
    }
    pub fn with_out_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.out_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_destination(mut self, dest: impl Into<String>) -> Self {
        self.destination = dest.into();
        self
    }
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }
    pub fn with_split(mut self, split: SplitCfg) -> Self {
        self.split = split;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    /// Merge overrides from the environment:
    /// - MAGPIE_CACHE_DIR: cache root
    /// - MAGPIE_REQUESTS_PER_SECOND: batch dispatch rate
    /// - MAGPIE_WORKERS: in-flight item fetches
    pub fn merge_env(mut self) -> Self {
        if let Some(dir) = env_parse::<PathBuf>("MAGPIE_CACHE_DIR") {
            self.cache_dir = dir;
        }
        if let Some(rps) = env_parse::<f64>("MAGPIE_REQUESTS_PER_SECOND") {
            self.requests_per_second = rps;
        }
        if let Some(n) = env_parse::<usize>("MAGPIE_WORKERS") {
            self = self.with_workers(n);
        }
        self
    }
}
