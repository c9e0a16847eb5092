//! Configuration types for bakery.yaml

use super::image::Image;
use crate::registry::Registry;
use crate::validation::{
    dedup_with_warning, require_unique, warn_if_empty, Validate, ValidationReport,
};
use serde::{Deserialize, Serialize};

/// Vendor label prefix used when the repository does not set one
pub const DEFAULT_LABEL_PREFIX: &str = "io.bakery.image";

/// Root bakery.yaml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BakeryConfigFile {
    /// Source repository metadata used for image labels
    #[serde(default)]
    pub repository: Repository,

    /// Registries every image publishes to unless overridden
    #[serde(default)]
    pub registries: Vec<Registry>,

    /// Images built from this context
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Source repository metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Public URL of the repository holding the image sources
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub vendor: String,

    #[serde(default)]
    pub maintainer: String,

    #[serde(default)]
    pub authors: Vec<String>,

    /// Commit the images are built from; looked up with git when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    /// Prefix for vendor labels (default `io.bakery.image`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_prefix: Option<String>,
}

impl Repository {
    pub fn label_prefix(&self) -> &str {
        self.label_prefix.as_deref().unwrap_or(DEFAULT_LABEL_PREFIX)
    }

    /// Maintainer followed by authors, comma separated
    pub fn authors_label(&self) -> String {
        std::iter::once(self.maintainer.as_str())
            .chain(self.authors.iter().map(String::as_str))
            .filter(|a| !a.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl BakeryConfigFile {
    pub fn image(&self, name: &str) -> Option<&Image> {
        self.images.iter().find(|i| i.name == name)
    }
}

impl Validate for BakeryConfigFile {
    fn validate(&mut self, context: &str, report: &mut ValidationReport) {
        warn_if_empty(&self.images, "images", context, report);
        dedup_with_warning(
            &mut self.registries,
            |r| r.base_url(),
            "registry",
            context,
            report,
        );
        require_unique(&self.images, |i| i.name.clone(), "image", context, report);

        for image in &mut self.images {
            let image_context = image.context_label();
            image.validate(&image_context, report);
        }
    }
}
