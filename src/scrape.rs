//! Paginated scrape of a user's upvoted listing, cached as a whole.

use crate::cache::FsCache;
use crate::date::DateParser;
use crate::html::{PageParser, ParsedPage};
use crate::item::UpvoteRecord;
use crate::transport::Transport;
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

/// Structural failures while reading listing pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    /// The page's meta rows and link rows disagree in count; the markup changed.
    RowMismatch { page: u32, meta: usize, links: usize },
    /// A meta href carried no integer `id=` parameter.
    MissingId { page: u32, href: String },
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeError::RowMismatch { page, meta, links } => write!(
                f,
                "page {} has {} meta rows but {} link rows; listing markup changed",
                page, meta, links
            ),
            ScrapeError::MissingId { page, href } => {
                write!(f, "page {}: no numeric id in {:?}", page, href)
            }
        }
    }
}

impl std::error::Error for ScrapeError {}

/// Walks `upvoted?id=<user>&p=1,2,...` until a page yields no rows.
pub struct UpvoteScraper {
    cache: FsCache,
    transport: Arc<dyn Transport>,
    parser: Arc<dyn PageParser>,
    dates: Arc<dyn DateParser>,
    listing_base: String,
    lifetime: Duration,
    page_delay: Duration,
}

impl UpvoteScraper {
    pub fn new(
        cache: FsCache,
        transport: Arc<dyn Transport>,
        parser: Arc<dyn PageParser>,
        dates: Arc<dyn DateParser>,
        listing_base: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            transport,
            parser,
            dates,
            listing_base: listing_base.into(),
            lifetime: Duration::from_secs(24 * 3600),
            page_delay: Duration::from_secs(1),
        }
    }

    pub fn lifetime(mut self, lifetime: Duration) -> Self { self.lifetime = lifetime; self }
    pub fn page_delay(mut self, delay: Duration) -> Self { self.page_delay = delay; self }

    /// First-page URL; also the cache key for the whole listing.
    /// The username is query-encoded.
    pub fn listing_url(&self, username: &str) -> Result<String> {
        Ok(self.listing(username)?.into())
    }

    pub fn page_url(&self, username: &str, page: u32) -> Result<String> {
        let mut url = self.listing(username)?;
        url.query_pairs_mut().append_pair("p", &page.to_string());
        Ok(url.into())
    }

    fn listing(&self, username: &str) -> Result<Url> {
        let mut url = Url::parse(&self.listing_base)
            .with_context(|| format!("bad listing base {:?}", self.listing_base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("listing base {:?} cannot carry a path", self.listing_base))?
            .pop_if_empty()
            .push("upvoted");
        url.query_pairs_mut().append_pair("id", username);
        Ok(url)
    }

    /// All upvoted stories of `username`, newest first as listed.
    ///
    /// `token` is the server-issued session token; it is sent as the `user` cookie
    /// `<username>&<token>`. A cached listing younger than the lifetime is returned
    /// without any network activity.
    pub fn download(&self, username: &str, token: &str) -> Result<Vec<UpvoteRecord>> {
        let location = self.cache.path(&self.listing_url(username)?)?;
        if self.cache.is_valid(&location, self.lifetime) {
            tracing::info!(user = username, "loading upvotes from cache");
            let text = self
                .cache
                .load(&location)
                .with_context(|| format!("load cached upvotes {}", location.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("decode cached upvotes {}", location.display()));
        }

        tracing::info!(user = username, "fetching upvotes (not cached)");
        let cookie = format!("{}&{}", username, token);
        let mut records = Vec::new();
        let mut page = 1u32;
        loop {
            tracing::info!(user = username, page, "scraping upvotes page");
            let url = self.page_url(username, page)?;
            let html = self
                .transport
                .get(&url, Some(&cookie))
                .with_context(|| format!("fetch upvotes page {}", page))?;
            let parsed = self.parser.parse(&html);
            let rows = paired_rows(page, parsed)?;
            if rows.is_empty() {
                break;
            }

            let now = OffsetDateTime::now_utc();
            for ((href, age), (link, title)) in rows {
                records.push(self.to_record(page, href, age, link, title, now)?);
            }
            page += 1;
            if !self.page_delay.is_zero() {
                sleep(self.page_delay);
            }
        }

        tracing::info!(user = username, pages = page, records = records.len(), "upvotes scraped");
        let text = serde_json::to_string(&records).context("encode upvotes")?;
        self.cache.save(&location, &text)?;
        Ok(records)
    }

    fn to_record(
        &self,
        page: u32,
        href: String,
        age: String,
        link: String,
        title: String,
        now: OffsetDateTime,
    ) -> Result<UpvoteRecord> {
        let id = id_from_href(&href).ok_or_else(|| ScrapeError::MissingId { page, href: href.clone() })?;
        let time = match self.dates.parse(&age, now) {
            Some(t) => t,
            None => {
                tracing::debug!(id, age = %age, "unparseable age; using scrape time");
                now.unix_timestamp()
            }
        };
        Ok(UpvoteRecord { id, link, title, time_words: age, time })
    }
}

/// Zip meta and link rows, rejecting pages where their counts differ.
pub fn paired_rows(
    page: u32,
    parsed: ParsedPage,
) -> Result<Vec<((String, String), (String, String))>, ScrapeError> {
    if parsed.meta.len() != parsed.links.len() {
        return Err(ScrapeError::RowMismatch {
            page,
            meta: parsed.meta.len(),
            links: parsed.links.len(),
        });
    }
    Ok(parsed.meta.into_iter().zip(parsed.links).collect())
}

/// Integer value of the `id=` query parameter of a (possibly relative) href like `item?id=123`.
pub fn id_from_href(href: &str) -> Option<u64> {
    let base = Url::parse("https://localhost/").ok()?;
    let url = base.join(href).ok()?;
    let value = url.query_pairs().find(|(k, _)| k == "id").map(|(_, v)| v.into_owned())?;
    value.trim().parse().ok()
}
