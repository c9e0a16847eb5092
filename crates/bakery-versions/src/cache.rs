//! In-memory HTTP response cache
//!
//! Responses are keyed by URL and expire after a fixed TTL. One cache is
//! shared by every fetcher in a process so repeated resolution passes do
//! not hit the network twice.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Default time a cached response stays valid
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Statistics about cache usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of expired entries encountered
    pub expired: u64,
    /// Total number of cached entries
    pub entries: usize,
}

impl CacheStats {
    /// Get hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone)]
struct CachedResponse {
    fetched_at: Instant,
    body: String,
}

/// URL-keyed response cache with a TTL
#[derive(Debug)]
pub struct HttpCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedResponse>>,
    stats: RwLock<CacheStats>,
}

impl Default for HttpCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl HttpCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached body for `url` if present and not expired
    pub async fn get(&self, url: &str) -> Option<String> {
        let entries = self.entries.read().await;

        if let Some(entry) = entries.get(url) {
            if entry.fetched_at.elapsed() >= self.ttl {
                debug!("Cache entry expired for: {}", url);
                drop(entries);

                self.entries.write().await.remove(url);
                let mut stats = self.stats.write().await;
                stats.expired += 1;
                stats.misses += 1;
                return None;
            }

            debug!("Cache hit for: {}", url);
            let body = entry.body.clone();
            drop(entries);
            self.stats.write().await.hits += 1;
            return Some(body);
        }
        drop(entries);

        self.stats.write().await.misses += 1;
        debug!("Cache miss for: {}", url);
        None
    }

    /// Store a response body
    pub async fn insert(&self, url: &str, body: String) {
        self.entries.write().await.insert(
            url.to_string(),
            CachedResponse {
                fetched_at: Instant::now(),
                body,
            },
        );
    }

    /// Drop every cached response
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().await.clone();
        stats.entries = self.entries.read().await.len();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hit_and_miss() {
        let cache = HttpCache::default();
        assert!(cache.get("https://example.invalid/a").await.is_none());
        cache
            .insert("https://example.invalid/a", "body".to_string())
            .await;
        assert_eq!(
            cache.get("https://example.invalid/a").await.as_deref(),
            Some("body")
        );

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = HttpCache::new(Duration::from_secs(60));
        cache.insert("u", "old".to_string()).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("u").await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("u").await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = HttpCache::default();
        cache.insert("u", "x".to_string()).await;
        cache.clear().await;
        assert!(cache.get("u").await.is_none());
    }
}
