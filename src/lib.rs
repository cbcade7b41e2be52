mod config;
mod util;
mod progress;
mod concurrency;

mod cache;
mod transport;
mod item;
mod fetcher;

mod html;
mod date;
mod scrape;
mod sampler;

mod assemble;
mod ndjson;
mod sink;
mod pipeline;

pub use crate::config::{credential_from_env, MagpieOptions, COOKIE_ENV};
pub use crate::pipeline::Magpie;
pub use crate::util::init_tracing_once;

// Cache and fetch core.
pub use crate::cache::{cache_path, FsCache};
pub use crate::concurrency::{Executor, PoolExecutor, RateLimited, RateLimiter};
pub use crate::fetcher::ItemFetcher;
pub use crate::transport::{HttpTransport, Transport};

// Records.
pub use crate::item::{DatasetRow, ItemKind, LabeledSample, RemoteItem, UpvoteRecord};

// Scraping collaborators and the scraper itself.
pub use crate::date::{DateParser, RelativeAgeParser};
pub use crate::html::{ListingPageParser, PageParser, ParsedPage};
pub use crate::scrape::{id_from_href, paired_rows, ScrapeError, UpvoteScraper};

pub use crate::sampler::{NeighborSample, NeighborSampler};

// Assembly and output.
pub use crate::assemble::{assemble, derive_host, derive_text, filter_neighbors, label_samples, split, to_row, SplitCfg, SplitDataset};
pub use crate::ndjson::{ExportFormat, NdjsonWriter};
pub use crate::sink::{DatasetSink, JsonlSink};
pub use crate::progress::{make_count_progress, maybe_count_progress};
