//! HTTP access behind a trait so sources can be tested without a network

use crate::cache::HttpCache;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Fetch a URL as text
///
/// A non-success status is an error; implementations never return an
/// empty body in place of a failure.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// Fetcher backed by a reqwest client
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bakery/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to request {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Request to {} failed ({}): {}", url, status, body));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {}", url))?;
        trace!("Received {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// Wraps another fetcher with the shared response cache
pub struct CachedFetcher<F> {
    inner: F,
    cache: Arc<HttpCache>,
}

impl<F: HttpFetch> CachedFetcher<F> {
    pub fn new(inner: F, cache: Arc<HttpCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<HttpCache> {
        &self.cache
    }
}

#[async_trait]
impl<F: HttpFetch> HttpFetch for CachedFetcher<F> {
    async fn get_text(&self, url: &str) -> Result<String> {
        if let Some(body) = self.cache.get(url).await {
            return Ok(body);
        }
        let body = self.inner.get_text(url).await?;
        self.cache.insert(url, body.clone()).await;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl HttpFetch for Counting {
        async fn get_text(&self, url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow!("connection refused: {}", url))
            } else {
                Ok(format!("body of {}", url))
            }
        }
    }

    #[tokio::test]
    async fn test_second_request_is_cached() {
        let fetcher = CachedFetcher::new(
            Counting {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            Arc::new(HttpCache::default()),
        );
        assert_eq!(fetcher.get_text("a").await.unwrap(), "body of a");
        assert_eq!(fetcher.get_text("a").await.unwrap(), "body of a");
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.cache().stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let fetcher = CachedFetcher::new(
            Counting {
                calls: AtomicUsize::new(0),
                fail: true,
            },
            Arc::new(HttpCache::default()),
        );
        assert!(fetcher.get_text("a").await.is_err());
        assert!(fetcher.get_text("a").await.is_err());
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fetcher.cache().stats().await.entries, 0);
    }
}
