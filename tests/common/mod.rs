#![allow(dead_code)]

use anyhow::Result;
use magpie::Transport;
use serde_json::json;
use std::sync::{Arc, Mutex};

type Handler = Box<dyn Fn(&str, Option<&str>) -> Result<String> + Send + Sync>;

/// In-memory transport: answers every GET through `handler` and records the call.
pub struct MockTransport {
    handler: Handler,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&str, Option<&str>) -> Result<String> + Send + Sync + 'static,
    {
        Arc::new(Self { handler: Box::new(handler), calls: Mutex::new(Vec::new()) })
    }

    /// Item endpoint mock: `story(id)` answers ids where `is_story(id)`, `null` elsewhere.
    pub fn items<P>(is_story: P) -> Arc<Self>
    where
        P: Fn(u64) -> bool + Send + Sync + 'static,
    {
        Self::new(move |url, _| {
            let id = item_id_from_url(url).expect("item url");
            Ok(if is_story(id) { story_json(id, 10) } else { "null".to_string() })
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn cookies(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str, cookie: Option<&str>) -> Result<String> {
        self.calls.lock().unwrap().push((url.to_string(), cookie.map(str::to_string)));
        (self.handler)(url, cookie)
    }
}

/// `.../item/123.json` -> 123
pub fn item_id_from_url(url: &str) -> Option<u64> {
    let tail = url.rsplit("/item/").next()?;
    tail.strip_suffix(".json")?.parse().ok()
}

pub fn story_json(id: u64, score: i64) -> String {
    json!({
        "id": id, "type": "story", "dead": false, "score": score, "by": "pg",
        "title": format!("Story {}", id), "url": format!("https://s{}.example.com/x", id),
        "time": 1_600_000_000i64 + id as i64, "descendants": 0
    })
    .to_string()
}

pub fn comment_json(id: u64) -> String {
    json!({ "id": id, "type": "comment", "by": "pg", "parent": 1, "text": "hi" }).to_string()
}

/// Minimal upvoted-listing page with one title row and one subtext row per story.
/// Rows are `(id, link, title, age)`.
pub fn listing_html(rows: &[(u64, &str, &str, &str)]) -> String {
    let mut body = String::from("<html><body><table>");
    for (id, link, title, age) in rows {
        body.push_str(&format!(
            "<tr class=\"athing\" id=\"{id}\"><td class=\"title\"><span class=\"titleline\">\
             <a href=\"{link}\">{title}</a></span></td></tr>\
             <tr><td class=\"subtext\"><span class=\"score\">5 points</span> \
             <span class=\"age\" title=\"2024-01-01T00:00:00\"><a href=\"item?id={id}\">{age}</a></span></td></tr>"
        ));
    }
    body.push_str("</table></body></html>");
    body
}

pub fn empty_listing() -> String {
    "<html><body><table></table></body></html>".to_string()
}

/// `p=<n>` of a listing URL.
pub fn page_of(url: &str) -> Option<u32> {
    url.split(['?', '&']).find_map(|kv| kv.strip_prefix("p=")).and_then(|p| p.parse().ok())
}
