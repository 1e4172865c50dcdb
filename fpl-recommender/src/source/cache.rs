// Disk cache for API payloads, and the cached API source built on it.
//
// Each payload is stored as `<key>.json` in the cache directory. Freshness is
// judged by file modification time against a TTL. The cache is best effort:
// unreadable or stale entries are refetched, and failed writes are logged
// and otherwise ignored.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::source::client::{decode, FplClient, BOOTSTRAP_PATH, FIXTURES_PATH};
use crate::source::raw::{RawBootstrap, RawFixture};
use crate::source::DataSource;

const BOOTSTRAP_KEY: &str = "bootstrap-static";
const FIXTURES_KEY: &str = "fixtures";

// ---------------------------------------------------------------------------
// DiskCache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// The platform cache directory for this application, if the platform
    /// has one.
    pub fn default_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "fpl-recommender").map(|dirs| dirs.cache_dir().to_path_buf())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// The cached payload for `key` if it exists, is younger than the TTL and
    /// parses as JSON.
    pub async fn read_fresh(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key);
        let modified = fs::metadata(&path).await.and_then(|m| m.modified()).ok()?;
        // A modification time in the future counts as brand new.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= self.ttl {
            debug!(key, age_secs = age.as_secs(), "cache entry stale");
            return None;
        }

        let raw = fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                let written: DateTime<Utc> = modified.into();
                debug!(key, written = %written.to_rfc3339(), "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, "discarding unreadable cache entry: {e}");
                None
            }
        }
    }

    /// Store a payload. Writes go through a temporary file so a reader never
    /// sees a half-written entry.
    pub async fn write(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(value).context("serialize cache entry")?;
        fs::write(&tmp, json).await.context("write cache entry")?;
        fs::rename(&tmp, &path).await.context("swap cache entry")?;
        Ok(())
    }

    /// Return the fresh cached payload for `key`, or run `fetch`, store its
    /// result and return it. Fetch errors propagate; write errors do not.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> anyhow::Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Value>>,
    {
        if let Some(value) = self.read_fresh(key).await {
            return Ok(value);
        }

        let value = fetch().await?;
        if let Err(e) = self.write(key, &value).await {
            warn!(key, "failed to write cache entry: {e:#}");
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// CachedSource
// ---------------------------------------------------------------------------

/// The FPL API behind a [`DiskCache`], with a minimum gap between remote
/// calls so back-to-back fetches do not hammer the API.
pub struct CachedSource {
    client: FplClient,
    cache: DiskCache,
    throttle: Duration,
    last_remote: Mutex<Option<Instant>>,
}

impl CachedSource {
    pub fn new(client: FplClient, cache: DiskCache, throttle: Duration) -> Self {
        Self {
            client,
            cache,
            throttle,
            last_remote: Mutex::new(None),
        }
    }

    /// Build from config. An unset cache directory falls back to the
    /// platform cache dir, then to `.cache` under the working directory.
    pub fn from_config(config: &SourceConfig) -> anyhow::Result<Self> {
        let dir = match &config.cache_dir {
            Some(dir) => PathBuf::from(dir),
            None => DiskCache::default_dir().unwrap_or_else(|| PathBuf::from(".cache")),
        };
        Ok(Self::new(
            FplClient::from_config(config)?,
            DiskCache::new(dir, Duration::from_secs(config.cache_ttl_secs)),
            Duration::from_millis(config.throttle_ms),
        ))
    }

    async fn fetch_remote(&self, path: &str) -> anyhow::Result<Value> {
        let mut last = self.last_remote.lock().await;
        if let Some(at) = *last {
            let since = at.elapsed();
            if since < self.throttle {
                tokio::time::sleep(self.throttle - since).await;
            }
        }
        let result = self.client.fetch_json(path).await;
        *last = Some(Instant::now());
        result
    }

    async fn cached(&self, key: &str, path: &str) -> anyhow::Result<Value> {
        self.cache
            .get_or_fetch(key, || async {
                info!("fetching {path} from the FPL API");
                self.fetch_remote(path).await
            })
            .await
    }
}

#[async_trait]
impl DataSource for CachedSource {
    async fn bootstrap(&self) -> anyhow::Result<RawBootstrap> {
        decode(self.cached(BOOTSTRAP_KEY, BOOTSTRAP_PATH).await?, "bootstrap-static")
    }

    async fn fixtures(&self) -> anyhow::Result<Vec<RawFixture>> {
        decode(self.cached(FIXTURES_KEY, FIXTURES_PATH).await?, "fixtures")
    }

    fn describe(&self) -> String {
        format!(
            "{} (cached in {})",
            self.client.describe(),
            self.cache.dir().display()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fpl_cache_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn miss_fetches_then_hit_serves_from_disk() {
        let cache = DiskCache::new(temp_dir("hit"), Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .get_or_fetch("fixtures", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(serde_json::json!([{"id": 1}]))
                })
                .await
                .unwrap();
            assert_eq!(value[0]["id"], 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.dir().join("fixtures.json").exists());
    }

    #[tokio::test]
    async fn zero_ttl_always_refetches() {
        let cache = DiskCache::new(temp_dir("stale"), Duration::ZERO);
        cache.write("k", &serde_json::json!(1)).await.unwrap();
        assert!(cache.read_fresh("k").await.is_none());

        let value = cache
            .get_or_fetch("k", || async { Ok(serde_json::json!(2)) })
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!(2));
    }

    #[tokio::test]
    async fn write_creates_nested_dir_and_leaves_no_temp_file() {
        let dir = temp_dir("nested").join("a").join("b");
        let cache = DiskCache::new(&dir, Duration::from_secs(60));
        assert!(cache.read_fresh("k").await.is_none());

        cache.write("k", &serde_json::json!([1, 2])).await.unwrap();
        assert_eq!(cache.read_fresh("k").await, Some(serde_json::json!([1, 2])));
        assert!(!dir.join("k.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_entry_is_refetched() {
        let dir = temp_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("k.json"), "{not json").unwrap();
        let cache = DiskCache::new(&dir, Duration::from_secs(60));

        assert!(cache.read_fresh("k").await.is_none());
        let value = cache
            .get_or_fetch("k", || async { Ok(serde_json::json!({"ok": true})) })
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(cache.read_fresh("k").await, Some(serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn fetch_error_propagates_and_writes_nothing() {
        let cache = DiskCache::new(temp_dir("err"), Duration::from_secs(60));
        let err = cache
            .get_or_fetch("k", || async { Err(anyhow::anyhow!("boom")) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(!cache.dir().join("k.json").exists());
    }

    #[tokio::test]
    async fn cached_source_serves_warm_cache_without_network() {
        let dir = temp_dir("warm");
        let cache = DiskCache::new(&dir, Duration::from_secs(600));
        cache
            .write(
                BOOTSTRAP_KEY,
                &serde_json::json!({
                    "elements": [{"id": 1, "web_name": "Raya", "team": 1, "element_type": 1}],
                    "teams": [{"id": 1, "name": "Arsenal", "short_name": "ARS"}]
                }),
            )
            .await
            .unwrap();
        cache
            .write(FIXTURES_KEY, &serde_json::json!([{"team_h": 1, "team_a": 2}]))
            .await
            .unwrap();

        // The client points nowhere; any remote call would fail.
        let client = FplClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let source = CachedSource::new(client, cache, Duration::from_millis(400));

        let bootstrap = source.bootstrap().await.unwrap();
        assert_eq!(bootstrap.elements[0].web_name, "Raya");
        assert_eq!(source.fixtures().await.unwrap().len(), 1);
        assert!(source.describe().contains("cached in"));
    }
}
