#[path = "common/mod.rs"]
mod common;

use anyhow::anyhow;
use common::*;
use magpie::{FsCache, ItemFetcher, NeighborSampler, PoolExecutor, RateLimited, RateLimiter, Transport};
use std::sync::Arc;
use std::time::Duration;

const ITEM_BASE: &str = "https://hacker-news.firebaseio.com/v0";

fn setup(cache: &FsCache, mock: Arc<MockTransport>) -> (ItemFetcher, RateLimited<PoolExecutor>) {
    let t: Arc<dyn Transport> = mock;
    let fetcher = ItemFetcher::new(cache.clone(), t, ITEM_BASE, Duration::from_secs(3600));
    let exec = RateLimited::new(PoolExecutor::new(4).unwrap(), RateLimiter::per_second(0.0));
    (fetcher, exec)
}

#[test]
fn dense_neighborhood_converges_in_one_round() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let mock = MockTransport::items(|id| (9000..11000).contains(&id));
    let (fetcher, exec) = setup(&cache, mock.clone());

    let out = NeighborSampler::new(&fetcher, &exec).sample(10000, 3).unwrap();

    assert_eq!(out.rounds, 1);
    assert!(!out.exhausted);
    let ids: Vec<u64> = out.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![9994, 9995, 9996], "first qualifying items in window order");
    assert_eq!(mock.call_count(), 12, "window is [start - 2c, start + 2c)");
}

#[test]
fn empty_first_window_shifts_left_once() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    // First window [9994, 10006) holds only comments; the second, [9982, 9994), has stories.
    let mock = MockTransport::new(|url, _| {
        let id = item_id_from_url(url).unwrap();
        Ok(if (9982..9994).contains(&id) { story_json(id, 10) } else { comment_json(id) })
    });
    let (fetcher, exec) = setup(&cache, mock.clone());

    let out = NeighborSampler::new(&fetcher, &exec).sample(10000, 3).unwrap();

    assert_eq!(out.rounds, 2);
    assert!(!out.exhausted);
    let ids: Vec<u64> = out.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![9982, 9983, 9984]);
    assert_eq!(mock.call_count(), 24);
}

#[test]
fn partial_rounds_accumulate() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    // One story in the first window, plenty in the second.
    let mock = MockTransport::items(|id| id == 10003 || (9982..9994).contains(&id));
    let (fetcher, exec) = setup(&cache, mock);

    let out = NeighborSampler::new(&fetcher, &exec).sample(10000, 3).unwrap();
    let ids: Vec<u64> = out.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![10003, 9982, 9983]);
    assert_eq!(out.rounds, 2);
}

#[test]
fn barren_id_space_stops_at_round_limit() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let mock = MockTransport::items(|_| false);
    let (fetcher, exec) = setup(&cache, mock.clone());

    let out = NeighborSampler::new(&fetcher, &exec).max_rounds(3).sample(50_000, 2).unwrap();
    assert!(out.exhausted);
    assert!(out.items.is_empty());
    assert_eq!(out.rounds, 3);
    assert_eq!(mock.call_count(), 3 * 8);
}

#[test]
fn window_never_goes_below_first_id() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let mock = MockTransport::items(|_| false);
    let (fetcher, exec) = setup(&cache, mock.clone());

    let out = NeighborSampler::new(&fetcher, &exec).sample(5, 2).unwrap();
    assert!(out.exhausted);
    assert_eq!(out.rounds, 1);
    let mut ids: Vec<u64> = mock.urls().iter().filter_map(|u| item_id_from_url(u)).collect();
    ids.sort();
    assert_eq!(ids, (1..9).collect::<Vec<u64>>());
}

#[test]
fn min_score_is_respected() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let mock = MockTransport::new(|url, _| {
        let id = item_id_from_url(url).unwrap();
        Ok(story_json(id, if id % 2 == 0 { 100 } else { 1 }))
    });
    let (fetcher, exec) = setup(&cache, mock);

    let out = NeighborSampler::new(&fetcher, &exec).min_score(50).sample(1000, 2).unwrap();
    assert!(out.items.iter().all(|i| i.id % 2 == 0 && i.score >= 50));
    assert_eq!(out.items.len(), 2);
}

#[test]
fn fetch_failure_fails_the_sample_after_siblings_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let mock = MockTransport::new(|url, _| {
        let id = item_id_from_url(url).unwrap();
        if id == 10001 { Err(anyhow!("timeout")) } else { Ok(story_json(id, 10)) }
    });
    let (fetcher, exec) = setup(&cache, mock.clone());

    assert!(NeighborSampler::new(&fetcher, &exec).sample(10000, 1).is_err());
    assert_eq!(mock.call_count(), 4);
    for id in [9998u64, 9999, 10000] {
        let loc = cache.path(&fetcher.item_url(id)).unwrap();
        assert!(loc.is_file(), "sibling {} should be cached", id);
    }
}

#[test]
fn overlapping_windows_reuse_the_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let mock = MockTransport::items(|_| true);
    let (fetcher, exec) = setup(&cache, mock.clone());
    let sampler = NeighborSampler::new(&fetcher, &exec);

    sampler.sample(500, 2).unwrap();
    let after_first = mock.call_count();
    sampler.sample(501, 2).unwrap();
    assert_eq!(mock.call_count(), after_first + 1, "only id 504 is new");
    sampler.sample(500, 2).unwrap();
    assert_eq!(mock.call_count(), after_first + 1);
}

#[test]
fn zero_count_fetches_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let mock = MockTransport::items(|_| true);
    let (fetcher, exec) = setup(&cache, mock.clone());
    let out = NeighborSampler::new(&fetcher, &exec).sample(100, 0).unwrap();
    assert!(out.items.is_empty());
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn seed_beyond_signed_range_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let mock = MockTransport::items(|_| true);
    let (fetcher, exec) = setup(&cache, mock.clone());

    let err = NeighborSampler::new(&fetcher, &exec).sample(u64::MAX, 2).unwrap_err();
    assert!(err.to_string().contains("out of range"), "{:#}", err);
    assert_eq!(mock.call_count(), 0);
}
