use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Item type reported by the item endpoint. Unrecognized types map to `Other`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Story,
    Comment,
    Job,
    Poll,
    PollOpt,
    #[default]
    #[serde(other)]
    Other,
}

/// One item from the remote API: the fields the sampler relies on, plus everything else.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    /// Remaining fields (`by`, `kids`, `descendants`, ...), ordered for stable output.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RemoteItem {
    /// Story, not dead, score at or above `min_score`.
    pub fn qualifies(&self, min_score: i64) -> bool {
        self.kind == ItemKind::Story && !self.dead && self.score >= min_score
    }
}

/// A row of the user's upvoted listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpvoteRecord {
    pub id: u64,
    pub link: String,
    pub title: String,
    /// Relative age as shown on the page, e.g. "3 days ago".
    pub time_words: String,
    /// Unix seconds derived from `time_words`; the scrape time when that text didn't parse.
    pub time: i64,
}

/// Binary label: 1 for upvoted, 0 for a sampled neighbor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub label: u8,
    pub id: u64,
    pub link: String,
    pub title: String,
    pub time: i64,
}

impl LabeledSample {
    pub fn positive(r: &UpvoteRecord) -> Self {
        Self { label: 1, id: r.id, link: r.link.clone(), title: r.title.clone(), time: r.time }
    }

    /// Missing `url`/`title`/`time` become empty strings and 0 (text posts have no url).
    pub fn negative(item: &RemoteItem) -> Self {
        Self {
            label: 0,
            id: item.id,
            link: item.url.clone().unwrap_or_default(),
            title: item.title.clone().unwrap_or_default(),
            time: item.time.unwrap_or(0),
        }
    }
}

/// Final record handed to the sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub label: u8,
    pub id: u64,
    pub link: String,
    pub title: String,
    pub time: i64,
    pub host: String,
    pub text: String,
}
