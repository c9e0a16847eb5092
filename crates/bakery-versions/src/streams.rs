//! Product release streams for development versions
//!
//! A stream is a JSON document at `{base}/{product}/{channel}.json`
//! describing the latest build of a product on a channel:
//!
//! ```json
//! { "version": "2025.09.0-dev+123", "downloads": { "ubuntu2204": "https://..." } }
//! ```

use crate::http::HttpFetch;
use anyhow::{anyhow, Context, Result};
use bakery_core::{
    BakeryConfigFile, DevVersionSource, Error, ReleaseStreams, RuntimeSettings, StreamRelease,
};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Client for the release stream service
pub struct ReleaseStreamClient {
    http: Arc<dyn HttpFetch>,
    base_url: Option<String>,
}

impl ReleaseStreamClient {
    pub fn new(http: Arc<dyn HttpFetch>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: Some(base_url.into().trim_end_matches('/').to_string()),
        }
    }

    /// Client using the base URL from runtime settings, if any
    pub fn from_settings(http: Arc<dyn HttpFetch>, settings: &RuntimeSettings) -> Self {
        Self {
            http,
            base_url: settings.release_stream_url.clone(),
        }
    }

    fn stream_url(&self, product: &str, channel: &str) -> Result<String> {
        let base = self.base_url.as_deref().ok_or_else(|| {
            anyhow!(
                "Release stream {}/{} requested but BAKERY_RELEASE_STREAM_URL is not set",
                product,
                channel
            )
        })?;
        Ok(format!("{}/{}/{}.json", base, product, channel))
    }

    /// Latest release of `product` on `channel`
    pub async fn release(&self, product: &str, channel: &str) -> Result<StreamRelease> {
        let url = self.stream_url(product, channel)?;
        let body = self
            .http
            .get_text(&url)
            .await
            .with_context(|| format!("Failed to fetch release stream {}/{}", product, channel))?;
        let release: StreamRelease = serde_json::from_str(&body)
            .with_context(|| format!("Invalid release stream document at {}", url))?;
        if release.version.trim().is_empty() {
            return Err(anyhow!("Release stream {}/{} has no version", product, channel));
        }
        debug!("{}/{} is at {}", product, channel, release.version);
        Ok(release)
    }

    /// Fetch every stream referenced by a development version in `config`
    pub async fn prefetch(&self, config: &BakeryConfigFile) -> Result<StaticReleaseStreams> {
        let needed = referenced_streams(config);
        if needed.is_empty() {
            return Ok(StaticReleaseStreams::default());
        }
        info!("Fetching {} release streams", needed.len());

        let results = join_all(needed.iter().map(|(product, channel)| async move {
            (
                (product.clone(), channel.clone()),
                self.release(product, channel).await,
            )
        }))
        .await;

        let mut streams = StaticReleaseStreams::default();
        for ((product, channel), result) in results {
            streams.insert(product, channel, result?);
        }
        Ok(streams)
    }
}

/// `(product, channel)` pairs used by stream-sourced development versions
pub fn referenced_streams(config: &BakeryConfigFile) -> BTreeSet<(String, String)> {
    config
        .images
        .iter()
        .flat_map(|image| image.dev_versions.iter())
        .filter_map(|dev| match &dev.source {
            DevVersionSource::Stream { product, channel } => {
                Some((product.clone(), channel.clone()))
            }
            DevVersionSource::Env { .. } => None,
        })
        .collect()
}

/// Release stream documents held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticReleaseStreams {
    releases: HashMap<(String, String), StreamRelease>,
}

impl StaticReleaseStreams {
    pub fn with(
        mut self,
        product: impl Into<String>,
        channel: impl Into<String>,
        release: StreamRelease,
    ) -> Self {
        self.insert(product, channel, release);
        self
    }

    pub fn insert(
        &mut self,
        product: impl Into<String>,
        channel: impl Into<String>,
        release: StreamRelease,
    ) {
        self.releases
            .insert((product.into(), channel.into()), release);
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

impl ReleaseStreams for StaticReleaseStreams {
    fn release(&self, product: &str, channel: &str) -> bakery_core::Result<StreamRelease> {
        self.releases
            .get(&(product.to_string(), channel.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::VersionSource(anyhow!(
                    "release stream {}/{} was not fetched",
                    product,
                    channel
                ))
            })
    }
}
