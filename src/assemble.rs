//! Dataset assembly: label, derive features, shuffle, split.

use crate::item::{DatasetRow, LabeledSample, RemoteItem, UpvoteRecord};
use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use url::Url;

/// Shuffle and split parameters.
#[derive(Clone, Copy, Debug)]
pub struct SplitCfg {
    pub shuffle_seed: u64,
    pub split_seed: u64,
    /// Fraction of rows going to the test partition, in `[0, 1]`.
    pub test_ratio: f64,
}

impl Default for SplitCfg {
    fn default() -> Self {
        Self { shuffle_seed: 96, split_seed: 42, test_ratio: 0.2 }
    }
}

/// Train/test partitions of the final dataset.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SplitDataset {
    pub train: Vec<DatasetRow>,
    pub test: Vec<DatasetRow>,
}

impl SplitDataset {
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self) -> impl Iterator<Item = &DatasetRow> {
        self.train.iter().chain(self.test.iter())
    }
}

/// Authority of `link` exactly as written (userinfo, case and port untouched),
/// or `""` when the link is not an absolute `scheme://authority` URL.
pub fn derive_host(link: &str) -> String {
    let link = link.trim();
    let Ok(url) = Url::parse(link) else {
        return String::new();
    };
    if !url.has_host() {
        return String::new();
    }
    let Some(rest) = link.get(url.scheme().len() + 1..).and_then(|r| r.strip_prefix("//")) else {
        return String::new();
    };
    let end = rest.find(|c| matches!(c, '/' | '?' | '#')).unwrap_or(rest.len());
    rest[..end].to_string()
}

/// `title`, followed by `"\nSource: {host}"` when the host is known.
pub fn derive_text(title: &str, host: &str) -> String {
    if host.is_empty() {
        title.to_string()
    } else {
        format!("{}\nSource: {}", title, host)
    }
}

/// Flatten per-seed neighbor sets and drop any neighbor that is also an upvote.
///
/// Neighbors found from different seeds are kept even when they repeat.
pub fn filter_neighbors<I>(upvotes: &[UpvoteRecord], neighbor_sets: I) -> Vec<RemoteItem>
where
    I: IntoIterator<Item = Vec<RemoteItem>>,
{
    let upvoted: AHashSet<u64> = upvotes.iter().map(|u| u.id).collect();
    neighbor_sets
        .into_iter()
        .flatten()
        .filter(|item| !upvoted.contains(&item.id))
        .collect()
}

/// Positives first, then negatives, in input order.
pub fn label_samples(upvotes: &[UpvoteRecord], neighbors: &[RemoteItem]) -> Vec<LabeledSample> {
    upvotes
        .iter()
        .map(LabeledSample::positive)
        .chain(neighbors.iter().map(LabeledSample::negative))
        .collect()
}

pub fn to_row(sample: LabeledSample) -> DatasetRow {
    let host = derive_host(&sample.link);
    let text = derive_text(&sample.title, &host);
    DatasetRow {
        label: sample.label,
        id: sample.id,
        link: sample.link,
        title: sample.title,
        time: sample.time,
        host,
        text,
    }
}

/// Shuffle with `shuffle_seed`, then permute with `split_seed` and take the first
/// `ceil(n * test_ratio)` rows as test. Same inputs and seeds give the same split.
pub fn split(mut rows: Vec<DatasetRow>, cfg: &SplitCfg) -> SplitDataset {
    rows.shuffle(&mut StdRng::seed_from_u64(cfg.shuffle_seed));
    rows.shuffle(&mut StdRng::seed_from_u64(cfg.split_seed));

    let ratio = cfg.test_ratio.clamp(0.0, 1.0);
    let n_test = ((rows.len() as f64) * ratio).ceil() as usize;
    let train = rows.split_off(n_test.min(rows.len()));
    SplitDataset { train, test: rows }
}

/// Label, featurize, and split. `neighbors` must already exclude upvoted IDs.
pub fn assemble(upvotes: &[UpvoteRecord], neighbors: &[RemoteItem], cfg: &SplitCfg) -> SplitDataset {
    let rows: Vec<DatasetRow> = label_samples(upvotes, neighbors).into_iter().map(to_row).collect();
    let out = split(rows, cfg);
    tracing::info!(
        positives = upvotes.len(),
        negatives = neighbors.len(),
        train = out.train.len(),
        test = out.test.len(),
        "dataset assembled"
    );
    out
}
