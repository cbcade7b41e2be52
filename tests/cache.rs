use magpie::{cache_path, FsCache};
use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, SystemTime};

#[test]
fn path_is_deterministic_and_hierarchical() {
    let cache = FsCache::new("/tmp/c");
    let url = "https://hacker-news.firebaseio.com/v0/item/8863.json";
    let a = cache.path(url).unwrap();
    let b = cache.path(url).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, Path::new("/tmp/c/https/hacker-news.firebaseio.com/v0/item/8863.json"));
}

#[test]
fn query_is_folded_into_last_segment() {
    let p = cache_path("https://news.ycombinator.com/upvoted?id=alice", Path::new("c")).unwrap();
    assert_eq!(p, Path::new("c/https/news.ycombinator.com/upvoted_id=alice"));

    let page2 = cache_path("https://news.ycombinator.com/upvoted?id=alice&p=2", Path::new("c")).unwrap();
    assert_ne!(p, page2, "distinct queries must map to distinct entries");
}

#[test]
fn port_and_bare_host_are_kept() {
    let p = cache_path("http://localhost:8080/", Path::new("c")).unwrap();
    assert_eq!(p, Path::new("c/http/localhost:8080/_"));
}

#[test]
fn unparseable_url_is_an_error() {
    assert!(cache_path("not a url", Path::new("c")).is_err());
}

#[test]
fn save_then_load_round_trips_and_overwrites() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let loc = cache.path("https://example.com/a/b/c?x=1").unwrap();

    cache.save(&loc, "{\"v\":1}").unwrap();
    assert_eq!(cache.load(&loc).unwrap(), "{\"v\":1}");

    cache.save(&loc, "second").unwrap();
    assert_eq!(cache.load(&loc).unwrap(), "second");
    assert_eq!(cache.entry_count(), 1);
}

#[test]
fn load_of_missing_entry_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let loc = cache.path("https://example.com/missing").unwrap();
    let err = cache.load(&loc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!cache.is_valid(&loc, Duration::from_secs(3600)));
}

#[test]
fn validity_expires_after_lifetime() {
    let tmp = tempfile::tempdir().unwrap();
    let cache = FsCache::new(tmp.path());
    let loc = cache.path("https://example.com/fresh").unwrap();
    cache.save(&loc, "x").unwrap();

    let lifetime = Duration::from_secs(60);
    assert!(cache.is_valid(&loc, lifetime));

    let later = SystemTime::now() + lifetime + Duration::from_secs(1);
    assert!(!cache.is_valid_at(&loc, lifetime, later));
    assert!(!cache.is_valid(&loc, Duration::ZERO), "zero lifetime is never valid");
}

#[test]
fn clear_removes_everything() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("cache");
    let cache = FsCache::new(&root);
    for i in 0..3 {
        let loc = cache.path(&format!("https://example.com/item/{}.json", i)).unwrap();
        cache.save(&loc, "null").unwrap();
    }
    assert_eq!(cache.entry_count(), 3);

    cache.clear().unwrap();
    assert!(root.is_dir());
    assert_eq!(cache.entry_count(), 0);
}

#[test]
fn dot_segments_stay_below_root() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("cache");
    let cache = FsCache::new(&root);

    let loc = cache.path("https://news.ycombinator.com/upvoted?id=../../../../../escaped").unwrap();
    assert!(loc.starts_with(&root), "{} escaped {}", loc.display(), root.display());
    cache.save(&loc, "[]").unwrap();
    assert!(!tmp.path().join("escaped").exists());
    assert_eq!(cache.entry_count(), 1);

    let p = cache_path("https://example.com/a?/./..", Path::new("c")).unwrap();
    assert_eq!(p, Path::new("c/https/example.com/a_/%2E/%2E%2E"));
}
