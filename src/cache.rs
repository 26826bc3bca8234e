//! Time-boxed JSON cache for listings fetched from `arduino-cli`.
//!
//! Each dataset lives in its own file under `$INOX_HOME/cache`, shaped
//! `{"list": [...], "timestamp": <ms since epoch>}`. Lookups fall back
//! through fresh cache, live fetch, stale cache and finally the dataset's
//! built-in defaults, so a listing is always produced.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How long a cached listing is preferred over a live fetch (7 days).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A dataset that can be fetched live and cached.
pub trait ListSource {
    type Item: Serialize + DeserializeOwned;

    /// Short name used in logs ("boards", "libraries").
    fn name(&self) -> &'static str;

    fn fetch(&self) -> Result<Vec<Self::Item>>;

    /// Last-resort listing when neither the tool nor a cache is usable.
    fn defaults(&self) -> Vec<Self::Item> {
        Vec::new()
    }
}

/// Where the items of a [`Listing`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Live,
    Stale,
    Defaults,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Origin::Cache => "cache",
            Origin::Live => "arduino-cli",
            Origin::Stale => "stale cache",
            Origin::Defaults => "built-in defaults",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub origin: Origin,
}

/// State of a cache file on disk, for `inox status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Missing,
    Corrupt,
    Fresh { entries: usize, age: Duration },
    Stale { entries: usize, age: Duration },
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStatus::Missing => write!(f, "not cached"),
            CacheStatus::Corrupt => write!(f, "corrupt (will be refetched)"),
            CacheStatus::Fresh { entries, age } => {
                write!(f, "{} entries, {} old", entries, human_age(*age))
            }
            CacheStatus::Stale { entries, age } => {
                write!(f, "{} entries, {} old (expired)", entries, human_age(*age))
            }
        }
    }
}

#[derive(Deserialize)]
struct CacheRecord<T> {
    list: Vec<T>,
    timestamp: u64,
}

#[derive(Serialize)]
struct CacheRecordRef<'a, T> {
    list: &'a [T],
    timestamp: u64,
}

pub struct ListCache<S> {
    path: PathBuf,
    source: S,
    max_age: Duration,
}

impl<S: ListSource> ListCache<S> {
    pub fn new(path: impl Into<PathBuf>, source: S) -> Self {
        Self {
            path: path.into(),
            source,
            max_age: DEFAULT_MAX_AGE,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the listing, never failing.
    pub fn get_list(&self) -> Listing<S::Item> {
        let name = self.source.name();

        let cached = match self.read() {
            Some(record) if self.is_fresh(record.timestamp) => {
                tracing::debug!(dataset = name, entries = record.list.len(), "cache hit");
                return Listing {
                    items: record.list,
                    origin: Origin::Cache,
                };
            }
            other => other,
        };

        tracing::debug!(dataset = name, "cache miss, fetching live");
        match self.fetch_and_store() {
            Ok(items) => Listing {
                items,
                origin: Origin::Live,
            },
            Err(err) => {
                tracing::warn!(dataset = name, error = %format!("{err:#}"), "live fetch failed");
                match cached {
                    Some(record) => Listing {
                        items: record.list,
                        origin: Origin::Stale,
                    },
                    None => Listing {
                        items: self.source.defaults(),
                        origin: Origin::Defaults,
                    },
                }
            }
        }
    }

    /// Drop the cache file and fetch again. Fetch errors are returned as-is.
    pub fn refresh(&self) -> Result<Vec<S::Item>> {
        self.clear()?;
        self.fetch_and_store()
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove cache {}", self.path.display())),
        }
    }

    pub fn status(&self) -> CacheStatus {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return CacheStatus::Missing;
        };
        let Ok(record) = serde_json::from_str::<CacheRecord<S::Item>>(&content) else {
            return CacheStatus::Corrupt;
        };
        let entries = record.list.len();
        let age = age_of(record.timestamp);
        if self.is_fresh(record.timestamp) {
            CacheStatus::Fresh { entries, age }
        } else {
            CacheStatus::Stale { entries, age }
        }
    }

    fn fetch_and_store(&self) -> Result<Vec<S::Item>> {
        let items = self
            .source
            .fetch()
            .with_context(|| format!("Failed to fetch {}", self.source.name()))?;
        if let Err(err) = self.write(&items) {
            tracing::warn!(
                dataset = self.source.name(),
                error = %format!("{err:#}"),
                "could not persist cache"
            );
        }
        Ok(items)
    }

    /// Unreadable or unparsable files read as absent.
    fn read(&self) -> Option<CacheRecord<S::Item>> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::debug!(path = %self.path.display(), %err, "ignoring corrupt cache");
                None
            }
        }
    }

    fn write(&self, items: &[S::Item]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let record = CacheRecordRef {
            list: items,
            timestamp: now_millis(),
        };
        let json = serde_json::to_string(&record)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cache {}", self.path.display()))
    }

    fn is_fresh(&self, timestamp: u64) -> bool {
        age_of(timestamp) <= self.max_age
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Timestamps in the future count as age zero.
fn age_of(timestamp: u64) -> Duration {
    Duration::from_millis(now_millis().saturating_sub(timestamp))
}

fn human_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..60 => format!("{}s", secs),
        60..3600 => format!("{}m", secs / 60),
        3600..86400 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::Cell;

    struct FakeSource {
        items: Option<Vec<String>>,
        calls: Cell<usize>,
    }

    impl FakeSource {
        fn ok(items: &[&str]) -> Self {
            Self {
                items: Some(items.iter().map(|s| s.to_string()).collect()),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                items: None,
                calls: Cell::new(0),
            }
        }
    }

    impl ListSource for FakeSource {
        type Item = String;

        fn name(&self) -> &'static str {
            "fake"
        }

        fn fetch(&self) -> Result<Vec<String>> {
            self.calls.set(self.calls.get() + 1);
            match &self.items {
                Some(items) => Ok(items.clone()),
                None => bail!("tool unavailable"),
            }
        }

        fn defaults(&self) -> Vec<String> {
            vec!["default".to_string()]
        }
    }

    fn write_record(path: &Path, items: &[&str], timestamp: u64) {
        let json = serde_json::json!({ "list": items, "timestamp": timestamp });
        fs::write(path, json.to_string()).unwrap();
    }

    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    #[test]
    fn test_fresh_cache_is_returned_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.json");
        write_record(&path, &["cached"], now_millis() - DAY_MS);

        let cache = ListCache::new(&path, FakeSource::ok(&["live"]));
        let listing = cache.get_list();

        assert_eq!(listing.origin, Origin::Cache);
        assert_eq!(listing.items, vec!["cached"]);
        assert_eq!(cache.source.calls.get(), 0);
    }

    #[test]
    fn test_expired_cache_is_not_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.json");
        write_record(&path, &["old"], now_millis() - 8 * DAY_MS);

        let cache = ListCache::new(&path, FakeSource::ok(&["live"]));
        let listing = cache.get_list();

        assert_eq!(listing.origin, Origin::Live);
        assert_eq!(listing.items, vec!["live"]);
        assert!(matches!(cache.status(), CacheStatus::Fresh { entries: 1, .. }));
    }

    #[test]
    fn test_live_fetch_is_persisted_with_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fake.json");

        let cache = ListCache::new(&path, FakeSource::ok(&["a", "b"]));
        cache.get_list();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["list"], serde_json::json!(["a", "b"]));
        assert!(raw["timestamp"].as_u64().unwrap() > 0);

        // second lookup is served from disk
        let again = cache.get_list();
        assert_eq!(again.origin, Origin::Cache);
        assert_eq!(cache.source.calls.get(), 1);
    }

    #[test]
    fn test_stale_cache_used_when_fetch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.json");
        write_record(&path, &["old"], now_millis() - 30 * DAY_MS);

        let cache = ListCache::new(&path, FakeSource::failing());
        let listing = cache.get_list();

        assert_eq!(listing.origin, Origin::Stale);
        assert_eq!(listing.items, vec!["old"]);
    }

    #[test]
    fn test_defaults_when_nothing_available() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ListCache::new(dir.path().join("fake.json"), FakeSource::failing());
        let listing = cache.get_list();

        assert_eq!(listing.origin, Origin::Defaults);
        assert_eq!(listing.items, vec!["default"]);
    }

    #[test]
    fn test_corrupt_cache_behaves_like_missing() {
        let dir = tempfile::tempdir().unwrap();
        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        let missing = dir.path().join("missing.json");

        let a = ListCache::new(&corrupt, FakeSource::failing()).get_list();
        let b = ListCache::new(&missing, FakeSource::failing()).get_list();
        assert_eq!(a.origin, b.origin);
        assert_eq!(a.items, b.items);

        let c = ListCache::new(&corrupt, FakeSource::ok(&["live"]));
        assert_eq!(c.status(), CacheStatus::Corrupt);
        assert_eq!(c.get_list().origin, Origin::Live);
    }

    #[test]
    fn test_refresh_deletes_cache_and_propagates_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.json");
        write_record(&path, &["fresh"], now_millis());

        let cache = ListCache::new(&path, FakeSource::failing());
        let err = cache.refresh().unwrap_err();

        assert!(format!("{err:#}").contains("tool unavailable"));
        assert!(!path.exists());
        assert_eq!(cache.status(), CacheStatus::Missing);
    }

    #[test]
    fn test_refresh_refetches_even_when_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.json");
        write_record(&path, &["cached"], now_millis());

        let cache = ListCache::new(&path, FakeSource::ok(&["new"]));
        assert_eq!(cache.refresh().unwrap(), vec!["new"]);
        assert_eq!(cache.get_list().items, vec!["new"]);
    }

    #[test]
    fn test_custom_max_age() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.json");
        write_record(&path, &["cached"], now_millis() - 2 * DAY_MS);

        let cache =
            ListCache::new(&path, FakeSource::ok(&["live"])).with_max_age(Duration::from_secs(60));
        assert_eq!(cache.get_list().origin, Origin::Live);
    }

    #[test]
    fn test_future_timestamp_counts_as_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.json");
        write_record(&path, &["cached"], now_millis() + DAY_MS);

        let cache = ListCache::new(&path, FakeSource::failing());
        assert_eq!(cache.get_list().origin, Origin::Cache);
    }

    #[test]
    fn test_human_age() {
        assert_eq!(human_age(Duration::from_secs(5)), "5s");
        assert_eq!(human_age(Duration::from_secs(7200)), "2h");
        assert_eq!(human_age(Duration::from_secs(3 * 86400)), "3d");
    }
}
