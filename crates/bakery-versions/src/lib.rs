//! # bakery-versions
//!
//! HTTP-backed version sources for Bakery:
//! - Available versions of Python, R and Quarto
//! - Product release streams for development versions
//! - A shared in-memory response cache with a TTL
//!
//! The core resolver is synchronous, so sources are fetched up front with
//! [`prefetch`] and handed to it as static snapshots.

pub mod cache;
pub mod catalog;
pub mod http;
pub mod sources;
pub mod streams;

pub use cache::{CacheStats, HttpCache};
pub use catalog::{StaticVersionCatalog, VersionFetcher};
pub use http::{CachedFetcher, HttpFetch, ReqwestFetcher};
pub use streams::{ReleaseStreamClient, StaticReleaseStreams};

use anyhow::Result;
use bakery_core::{BakeryConfigFile, RuntimeSettings};
use std::sync::Arc;
use std::time::Duration;

/// Fetch every version list and release stream `config` refers to
///
/// Release streams are only looked up when `dev_versions` is set.
pub async fn prefetch(
    config: &BakeryConfigFile,
    settings: &RuntimeSettings,
    dev_versions: bool,
) -> Result<(StaticVersionCatalog, StaticReleaseStreams)> {
    let cache = Arc::new(HttpCache::new(Duration::from_secs(
        settings.http_cache_ttl_secs,
    )));
    let http: Arc<dyn HttpFetch> = Arc::new(CachedFetcher::new(
        ReqwestFetcher::new(Duration::from_secs(settings.http_timeout_secs))?,
        cache.clone(),
    ));

    let catalog = VersionFetcher::new(http.clone()).prefetch(config).await?;
    let streams = if dev_versions {
        ReleaseStreamClient::from_settings(http, settings)
            .prefetch(config)
            .await?
    } else {
        StaticReleaseStreams::default()
    };

    let stats = cache.stats().await;
    tracing::debug!(
        "Version prefetch finished: {} hits, {} misses",
        stats.hits,
        stats.misses
    );
    Ok((catalog, streams))
}
