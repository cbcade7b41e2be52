//! Disk-backed response cache: one file per URL, validity decided by file age.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use url::Url;
use walkdir::WalkDir;

/// Name used for the final segment when a URL has neither path nor query.
const EMPTY_PATH_SEGMENT: &str = "_";

/// File-system cache rooted at `root`.
///
/// The cache owns every file below its root. Writes are create-directories-then-write
/// and are not atomic; concurrent writers to the same key race but write identical bytes.
#[derive(Clone, Debug)]
pub struct FsCache {
    root: PathBuf,
}

impl FsCache {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// Location of `url` below this cache's root.
    pub fn path(&self, url: &str) -> Result<PathBuf> {
        cache_path(url, &self.root)
    }

    /// True iff the entry exists and was written less than `lifetime` ago.
    pub fn is_valid(&self, location: &Path, lifetime: Duration) -> bool {
        self.is_valid_at(location, lifetime, SystemTime::now())
    }

    /// Same as [`FsCache::is_valid`] with an explicit clock reading.
    /// An mtime later than `now` counts as age zero.
    pub fn is_valid_at(&self, location: &Path, lifetime: Duration, now: SystemTime) -> bool {
        let modified = match fs::metadata(location).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => return false,
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        age < lifetime
    }

    /// Read a cached payload. Absent entries surface as `ErrorKind::NotFound`.
    pub fn load(&self, location: &Path) -> io::Result<String> {
        fs::read_to_string(location)
    }

    /// Write (overwrite) a payload, creating intermediate directories.
    pub fn save(&self, location: &Path, content: &str) -> Result<()> {
        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create cache dir {}", parent.display()))?;
        }
        fs::write(location, content)
            .with_context(|| format!("write cache entry {}", location.display()))
    }

    /// Drop every entry and recreate an empty root.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("remove {}", self.root.display())),
        }
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create {}", self.root.display()))
    }

    /// Number of files currently cached.
    pub fn entry_count(&self) -> usize {
        if !self.root.exists() {
            return 0;
        }
        WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count()
    }
}

/// Map a URL to `<cache_dir>/<scheme>/<host[:port]>/<segment>/.../<last[_query]>`.
///
/// The query string is folded into the last path segment before splitting on `/`,
/// so a query containing `/` spills into extra directories. `.` and `..` segments are
/// escaped to `%2E`/`%2E%2E`, so every location stays below `cache_dir`.
pub fn cache_path(url: &str, cache_dir: &Path) -> Result<PathBuf> {
    let parsed = Url::parse(url).with_context(|| format!("unparseable cache url {:?}", url))?;

    let mut netloc = parsed.host_str().unwrap_or("").to_string();
    if let Some(port) = parsed.port() {
        netloc = format!("{}:{}", netloc, port);
    }

    let mut path = parsed.path().to_string();
    if let Some(q) = parsed.query() {
        path = format!("{}_{}", path, q);
    }

    let mut out = cache_dir.join(parsed.scheme());
    out.push(netloc);

    let mut pushed = false;
    for seg in path.trim_matches('/').split('/').filter(|s| !s.is_empty()) {
        out.push(escape_dot_segment(seg));
        pushed = true;
    }
    if !pushed {
        out.push(EMPTY_PATH_SEGMENT);
    }
    Ok(out)
}

fn escape_dot_segment(seg: &str) -> &str {
    match seg {
        "." => "%2E",
        ".." => "%2E%2E",
        _ => seg,
    }
}
