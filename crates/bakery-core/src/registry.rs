//! Container registries and registry inheritance
//!
//! Every node that can publish images (config root, image, version, matrix)
//! carries [`RegistryOverrides`]. A node either replaces its parent's
//! registries outright (`overrideRegistries`) or adds to them
//! (`extraRegistries`).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// A container registry destination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    /// Registry hostname (e.g., "ghcr.io", "docker.io")
    pub host: String,

    /// Namespace/organization under the host
    pub namespace: String,

    /// Optional repository path appended to the namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

impl Registry {
    pub fn new(host: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            namespace: namespace.into(),
            repository: None,
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// `host/namespace[/repository]`
    pub fn base_url(&self) -> String {
        match &self.repository {
            Some(repo) => format!("{}/{}/{}", self.host, self.namespace, repo),
            None => format!("{}/{}", self.host, self.namespace),
        }
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url())
    }
}

/// Registry settings of a single node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryOverrides {
    /// Registries added on top of the parent's
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_registries: Vec<Registry>,

    /// Registries replacing the parent's entirely
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub override_registries: Vec<Registry>,
}

impl RegistryOverrides {
    /// Both lists set on the same node is a configuration error
    pub fn is_conflicting(&self) -> bool {
        !self.extra_registries.is_empty() && !self.override_registries.is_empty()
    }

    /// Merge this node's registries with its parent's resolved registries
    ///
    /// An explicit override wins outright. Otherwise the node's extra
    /// registries come first, parent registries not already present are
    /// appended, and the result is sorted by base URL.
    pub fn resolve(&self, parent: &[Registry]) -> Vec<Registry> {
        if !self.override_registries.is_empty() {
            return self.override_registries.clone();
        }

        let mut merged = self.extra_registries.clone();
        for registry in parent {
            if merged.contains(registry) {
                debug!(
                    "Registry {} already declared closer to the target, keeping child entry",
                    registry
                );
                continue;
            }
            merged.push(registry.clone());
        }
        sorted_unique(merged)
    }
}

/// De-duplicate by value (first occurrence wins) and sort by base URL
pub fn sorted_unique(registries: Vec<Registry>) -> Vec<Registry> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Registry> = registries
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect();
    unique.sort_by_key(|r| r.base_url());
    unique
}
