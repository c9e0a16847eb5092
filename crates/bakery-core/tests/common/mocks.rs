//! Mock version sources

#![allow(dead_code)]

use bakery_core::{
    Dependency, DependencyVersion, Error, ReleaseStreams, Result, StreamRelease, VersionCatalog,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// Catalog answering from a fixed table and recording lookups
#[derive(Default)]
pub struct MockCatalog {
    versions: HashMap<Dependency, Vec<String>>,
    calls: RefCell<Vec<Dependency>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dependency: Dependency, versions: &[&str]) -> Self {
        self.versions
            .insert(dependency, versions.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn calls(&self) -> Vec<Dependency> {
        self.calls.borrow().clone()
    }
}

impl VersionCatalog for MockCatalog {
    fn available_versions(&self, dependency: Dependency) -> Result<Vec<DependencyVersion>> {
        self.calls.borrow_mut().push(dependency);
        let versions = self.versions.get(&dependency).ok_or_else(|| {
            Error::VersionSource(anyhow::anyhow!("mock has no versions for {}", dependency))
        })?;
        versions.iter().map(|v| DependencyVersion::parse(v)).collect()
    }
}

/// Release streams answering from a fixed table
#[derive(Default)]
pub struct MockStreams {
    releases: HashMap<(String, String), StreamRelease>,
}

impl MockStreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, product: &str, channel: &str, version: &str) -> Self {
        self.releases.insert(
            (product.to_string(), channel.to_string()),
            StreamRelease {
                version: version.to_string(),
                downloads: BTreeMap::new(),
            },
        );
        self
    }
}

impl ReleaseStreams for MockStreams {
    fn release(&self, product: &str, channel: &str) -> Result<StreamRelease> {
        self.releases
            .get(&(product.to_string(), channel.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::VersionSource(anyhow::anyhow!("no stream {}/{}", product, channel))
            })
    }
}
