//! Dependency version lists fetched over HTTP

use crate::http::HttpFetch;
use crate::sources::{parse_versions, versions_url};
use anyhow::{Context, Result};
use bakery_core::{BakeryConfigFile, Dependency, DependencyVersion, Error, VersionCatalog};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Fetches available versions from upstream sources
pub struct VersionFetcher {
    http: Arc<dyn HttpFetch>,
}

impl VersionFetcher {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self { http }
    }

    /// Available versions of `dependency`, newest first
    pub async fn available_versions(&self, dependency: Dependency) -> Result<Vec<DependencyVersion>> {
        let url = versions_url(dependency);
        let body = self
            .http
            .get_text(url)
            .await
            .with_context(|| format!("Failed to fetch {} versions", dependency))?;
        let versions = parse_versions(dependency, &body)?;
        debug!("Found {} {} versions", versions.len(), dependency);
        Ok(versions)
    }

    /// Fetch every dependency referenced by a constraint in `config`
    ///
    /// Lookups run concurrently. Any failure fails the whole prefetch.
    pub async fn prefetch(&self, config: &BakeryConfigFile) -> Result<StaticVersionCatalog> {
        let needed = constrained_dependencies(config);
        if needed.is_empty() {
            debug!("No dependency constraints, skipping version lookup");
            return Ok(StaticVersionCatalog::default());
        }
        info!("Fetching available versions for {} dependencies", needed.len());

        let results = join_all(needed.iter().map(|dep| async move {
            (*dep, self.available_versions(*dep).await)
        }))
        .await;

        let mut catalog = StaticVersionCatalog::default();
        for (dependency, result) in results {
            catalog.insert(dependency, result?);
        }
        Ok(catalog)
    }
}

/// Dependencies named by image or matrix constraints
pub fn constrained_dependencies(config: &BakeryConfigFile) -> BTreeSet<Dependency> {
    let mut deps = BTreeSet::new();
    for image in &config.images {
        deps.extend(image.dependency_constraints.iter().map(|c| c.dependency));
        if let Some(matrix) = &image.matrix {
            deps.extend(matrix.dependency_constraints.iter().map(|c| c.dependency));
        }
    }
    deps
}

/// Version lists held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticVersionCatalog {
    versions: HashMap<Dependency, Vec<DependencyVersion>>,
}

impl StaticVersionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dependency: Dependency, versions: Vec<DependencyVersion>) -> Self {
        self.insert(dependency, versions);
        self
    }

    pub fn insert(&mut self, dependency: Dependency, versions: Vec<DependencyVersion>) {
        self.versions.insert(dependency, versions);
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl VersionCatalog for StaticVersionCatalog {
    fn available_versions(
        &self,
        dependency: Dependency,
    ) -> bakery_core::Result<Vec<DependencyVersion>> {
        self.versions.get(&dependency).cloned().ok_or_else(|| {
            Error::VersionSource(anyhow::anyhow!(
                "versions of {} were not fetched",
                dependency
            ))
        })
    }
}
