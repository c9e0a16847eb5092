//! CLI command implementations

pub mod build;
pub mod plan;
pub mod render;
pub mod scan;
pub mod targets;
pub mod version;

use crate::cli::FilterArgs;
use crate::output;
use anyhow::{Context, Result};
use bakery_core::{BakeryConfig, ImageTarget, Resolver, RuntimeSettings, TargetFilter};
use camino::Utf8Path;
use std::collections::BTreeSet;
use tracing::debug;

/// Loaded configuration with every synthetic version materialized
pub struct Session {
    pub config: BakeryConfig,
    pub filter: TargetFilter,
}

impl Session {
    /// Load the config, fetch version sources and materialize versions
    pub async fn load(config_path: Option<&Utf8Path>, args: &FilterArgs) -> Result<Self> {
        let filter = args.to_filter()?;
        let mut config = BakeryConfig::load(config_path)?;
        debug!("Loaded {}", config.config_path);

        let settings = RuntimeSettings::from_env()?;
        let dev_versions = args.needs_dev_versions();
        let (catalog, streams) = bakery_versions::prefetch(config.file(), &settings, dev_versions)
            .await
            .context("Failed to fetch version sources")?;

        let resolver = Resolver::new(&catalog, &streams);
        let resolver = if dev_versions {
            resolver
        } else {
            resolver.without_dev_versions()
        };
        config.materialize(&resolver)?;

        Ok(Self { config, filter })
    }

    /// Targets selected by the filter
    pub fn targets(&self) -> Result<Vec<ImageTarget<'_>>> {
        let targets = self.config.filtered_targets(&self.filter)?;
        if targets.is_empty() {
            output::warning("No targets match the given filters");
        }
        Ok(targets)
    }
}

/// Distinct `(image, version)` pairs of `targets`, in target order
pub fn versions_of<'a>(targets: &[ImageTarget<'a>]) -> Vec<ImageTarget<'a>> {
    let mut seen = BTreeSet::new();
    targets
        .iter()
        .filter(|t| seen.insert((t.image.name.clone(), t.version.name.clone())))
        .cloned()
        .collect()
}
