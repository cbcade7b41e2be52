//! Blocking HTTP transport used by the scraper and the item fetcher.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, COOKIE, USER_AGENT};
use std::time::Duration;

/// A blocking GET returning the response body.
///
/// `cookie` is the raw value of the site's `user` cookie, passed through untouched.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, cookie: Option<&str>) -> Result<String>;
}

/// `reqwest`-backed transport. Non-2xx responses are errors; nothing is retried.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, cookie: Option<&str>) -> Result<String> {
        let mut req = self
            .client
            .get(url)
            .header(USER_AGENT, HeaderValue::from_static(concat!("magpie/", env!("CARGO_PKG_VERSION"))));
        if let Some(c) = cookie {
            let value = HeaderValue::from_str(&format!("user={}", c)).context("invalid cookie value")?;
            req = req.header(COOKIE, value);
        }
        let resp = req.send().with_context(|| format!("GET {}", url))?;
        let status = resp.status();
        anyhow::ensure!(status.is_success(), "GET {} returned {}", url, status);
        resp.text().with_context(|| format!("read body of {}", url))
    }
}
