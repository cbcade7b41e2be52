use crate::cache::FsCache;
use crate::item::RemoteItem;
use crate::transport::Transport;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Fetches single items by ID, reading through an [`FsCache`].
///
/// The raw response body is cached verbatim, including `null` bodies for missing
/// items and bodies that don't decode, so failing lookups are not repeated.
#[derive(Clone)]
pub struct ItemFetcher {
    cache: FsCache,
    transport: Arc<dyn Transport>,
    item_base: String,
    lifetime: Duration,
}

impl ItemFetcher {
    pub fn new(
        cache: FsCache,
        transport: Arc<dyn Transport>,
        item_base: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        Self { cache, transport, item_base: item_base.into(), lifetime }
    }

    /// Canonical item URL, e.g. `https://hacker-news.firebaseio.com/v0/item/8863.json`.
    pub fn item_url(&self, id: u64) -> String {
        format!("{}/item/{}.json", self.item_base.trim_end_matches('/'), id)
    }

    /// `Ok(None)` when the item is absent upstream or its payload is not an item object.
    /// Errors only when the remote call fails and no valid cache entry exists.
    pub fn fetch(&self, id: u64) -> Result<Option<RemoteItem>> {
        let url = self.item_url(id);
        let location = self.cache.path(&url)?;

        let body = if self.cache.is_valid(&location, self.lifetime) {
            self.cache
                .load(&location)
                .with_context(|| format!("load cached item {}", id))?
        } else {
            let body = self.transport.get(&url, None).with_context(|| format!("fetch item {}", id))?;
            self.cache.save(&location, &body)?;
            body
        };

        Ok(decode_item(id, &body))
    }
}

fn decode_item(id: u64, body: &str) -> Option<RemoteItem> {
    match serde_json::from_str::<Option<RemoteItem>>(body) {
        Ok(item) => item,
        Err(e) => {
            tracing::debug!(id, error = %e, "item payload is not a usable item");
            None
        }
    }
}
