//! Expansion of the configuration tree into build targets
//!
//! Resolution happens in two passes:
//! 1. [`Resolver::materialize`] turns development versions and the matrix
//!    into ordinary versions and attaches constraint-resolved dependency
//!    versions. This is the only pass that talks to version sources.
//! 2. [`resolve_targets`] walks version × OS × variant and produces one
//!    [`ImageTarget`] per combination, borrowing from the tree.

use crate::config::BakeryConfig;
use crate::error::{Error, Result};
use crate::target::ImageTarget;
use crate::types::{Image, ImageVariant, ImageVersionOs};
use crate::validation::{require_unique, ValidationReport};
use crate::version::{Dependency, DependencyVersion, DependencyVersions};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Source of the versions available for a dependency
///
/// Implementations must fail rather than return an empty list when the
/// source cannot be reached.
pub trait VersionCatalog {
    fn available_versions(&self, dependency: Dependency) -> Result<Vec<DependencyVersion>>;
}

/// Latest release of a product on a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRelease {
    pub version: String,

    /// Download URL per OS slug
    #[serde(default)]
    pub downloads: BTreeMap<String, String>,
}

/// Source of product release streams for development versions
pub trait ReleaseStreams {
    fn release(&self, product: &str, channel: &str) -> Result<StreamRelease>;
}

/// Sources that fail every lookup, for configs that need none
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVersionSources;

impl VersionCatalog for NoVersionSources {
    fn available_versions(&self, dependency: Dependency) -> Result<Vec<DependencyVersion>> {
        Err(Error::VersionSource(anyhow::anyhow!(
            "no version source configured for {}",
            dependency
        )))
    }
}

impl ReleaseStreams for NoVersionSources {
    fn release(&self, product: &str, channel: &str) -> Result<StreamRelease> {
        Err(Error::VersionSource(anyhow::anyhow!(
            "no release stream configured for {}/{}",
            product,
            channel
        )))
    }
}

/// Materializes synthetic versions using injected version sources
pub struct Resolver<'a> {
    catalog: &'a dyn VersionCatalog,
    streams: &'a dyn ReleaseStreams,
    dev_versions: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a dyn VersionCatalog, streams: &'a dyn ReleaseStreams) -> Self {
        Self {
            catalog,
            streams,
            dev_versions: true,
        }
    }

    /// Leave development versions out, avoiding their environment and stream lookups
    pub fn without_dev_versions(mut self) -> Self {
        self.dev_versions = false;
        self
    }

    /// Append development and matrix versions, then attach dependency versions
    ///
    /// Intended to run once per image after validation.
    pub fn materialize(&self, image: &mut Image) -> Result<()> {
        if self.dev_versions {
            for dev in &image.dev_versions {
                let version = dev.materialize(self.streams)?;
                info!(
                    "Adding development version {} to image {}",
                    version.name, image.name
                );
                image.versions.push(version);
            }
        }

        if let Some(matrix) = &image.matrix {
            let versions = matrix.materialize(self.catalog)?;
            debug!(
                "Matrix of image {} expanded to {} versions",
                image.name,
                versions.len()
            );
            image.versions.extend(versions);
        }

        let mut report = ValidationReport::new();
        require_unique(
            &image.versions,
            |v| v.name.clone(),
            "version",
            &image.context_label(),
            &mut report,
        );
        report.into_result(image.context_label())?;

        if image.dependency_constraints.is_empty() {
            return Ok(());
        }

        let mut resolved: Vec<DependencyVersions> = Vec::new();
        for constraint in &image.dependency_constraints {
            let candidates = self.catalog.available_versions(constraint.dependency)?;
            resolved.push(constraint.resolve(&candidates)?);
        }

        for version in image.versions.iter_mut() {
            if version.dependencies.is_empty() {
                version.dependencies = resolved.clone();
            }
        }

        debug!(
            "Attached {} resolved dependencies to versions of image {}",
            resolved.len(),
            image.name
        );

        Ok(())
    }
}

/// Expand one image into targets: versions, then OS, then variants
///
/// Versions without an OS still produce targets, without OS-specific
/// Containerfile candidates or tags.
pub fn resolve_targets<'a>(config: &'a BakeryConfig, image: &'a Image) -> Vec<ImageTarget<'a>> {
    if image.versions.is_empty() {
        warn!("Image {} has no versions to build", image.name);
        return Vec::new();
    }

    let variants: Vec<Option<&ImageVariant>> = if image.variants.is_empty() {
        vec![None]
    } else {
        image.variants.iter().map(Some).collect()
    };

    let mut targets = Vec::new();
    for version in &image.versions {
        let os_list: Vec<Option<&ImageVersionOs>> = if version.os.is_empty() {
            warn!(
                "Version {} of image {} has no operating systems",
                version.name, image.name
            );
            vec![None]
        } else {
            version.os.iter().map(Some).collect()
        };

        for os in &os_list {
            for variant in &variants {
                targets.push(ImageTarget::new(config, image, version, *variant, *os));
            }
        }
    }

    debug!("Image {} resolved to {} targets", image.name, targets.len());
    targets
}

/// Fail when two targets share a uid
pub fn ensure_unique_uids(targets: &[ImageTarget<'_>]) -> Result<()> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for target in targets {
        *seen.entry(target.uid()).or_default() += 1;
    }
    let mut duplicates: Vec<String> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(uid, count)| format!("Target uid '{}' is produced {} times", uid, count))
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        duplicates.sort();
        Err(Error::validation("build targets", duplicates))
    }
}
