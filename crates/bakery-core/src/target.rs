//! Image targets
//!
//! An [`ImageTarget`] is one (image, version, variant, OS) combination. It
//! borrows from the configuration tree and derives everything a build, test
//! or scan needs: uid, Containerfile, tags and labels.

use crate::config::BakeryConfig;
use crate::error::{Error, Result};
use crate::options::{GossOptions, SnykOptions, ToolKind, ToolOptions};
use crate::registry::Registry;
use crate::tags::{TagPattern, TagTokens};
use crate::types::{Image, ImageVariant, ImageVersion, ImageVersionOs};
use crate::utils::{repository_name, slugify};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const OCI_LABEL_PREFIX: &str = "org.opencontainers.image";
const CONTAINERFILE: &str = "Containerfile";

/// One resolved build unit
#[derive(Debug, Clone)]
pub struct ImageTarget<'a> {
    config: &'a BakeryConfig,
    pub image: &'a Image,
    pub version: &'a ImageVersion,
    pub variant: Option<&'a ImageVariant>,
    pub os: Option<&'a ImageVersionOs>,
    /// Patterns that apply to this target
    pub tag_patterns: Vec<TagPattern>,
    created: DateTime<Utc>,
}

impl<'a> ImageTarget<'a> {
    pub fn new(
        config: &'a BakeryConfig,
        image: &'a Image,
        version: &'a ImageVersion,
        variant: Option<&'a ImageVariant>,
        os: Option<&'a ImageVersionOs>,
    ) -> Self {
        let mut target = Self {
            config,
            image,
            version,
            variant,
            os,
            tag_patterns: Vec::new(),
            created: Utc::now(),
        };
        target.tag_patterns = image
            .tag_patterns_for(variant)
            .into_iter()
            .filter(|p| {
                p.applies(
                    target.is_latest(),
                    target.is_primary_os(),
                    target.is_primary_variant(),
                )
            })
            .collect();
        target
    }

    /// Filesystem and bake safe identifier, unique across a resolution
    pub fn uid(&self) -> String {
        let mut parts = vec![self.image.name.as_str(), self.version.name.as_str()];
        if let Some(variant) = self.variant {
            parts.push(&variant.name);
        }
        if let Some(os) = self.os {
            parts.push(&os.name);
        }
        slugify(&parts.join(" "))
    }

    pub fn image_name(&self) -> &str {
        &self.image.name
    }

    pub fn context(&self) -> &Utf8Path {
        self.config.context()
    }

    pub fn is_latest(&self) -> bool {
        self.version.latest
    }

    /// Targets without an OS count as primary
    pub fn is_primary_os(&self) -> bool {
        self.os.is_none_or(|os| os.primary)
    }

    /// Targets without a variant count as primary
    pub fn is_primary_variant(&self) -> bool {
        self.variant.is_none_or(|variant| variant.primary)
    }

    pub fn is_development_version(&self) -> bool {
        self.version.is_development_version
    }

    pub fn image_path(&self) -> Utf8PathBuf {
        self.image.path(self.context())
    }

    pub fn version_path(&self) -> Utf8PathBuf {
        self.version.path(&self.image_path())
    }

    /// Containerfile names tried in order, most specific first
    pub fn containerfile_candidates(&self) -> Vec<Utf8PathBuf> {
        let dir = self.version_path();
        let os_ext = self.os.map(|o| o.extension.as_str()).filter(|e| !e.is_empty());
        let variant_ext = self
            .variant
            .map(|v| v.extension.as_str())
            .filter(|e| !e.is_empty());

        let mut names = Vec::new();
        if let (Some(os), Some(variant)) = (os_ext, variant_ext) {
            names.push(format!("{}.{}.{}", CONTAINERFILE, os, variant));
        }
        if let Some(variant) = variant_ext {
            names.push(format!("{}.{}", CONTAINERFILE, variant));
        }
        if let Some(os) = os_ext {
            names.push(format!("{}.{}", CONTAINERFILE, os));
        }
        names.push(CONTAINERFILE.to_string());

        names.into_iter().map(|name| dir.join(name)).collect()
    }

    /// First existing Containerfile candidate
    pub fn containerfile(&self) -> Result<Utf8PathBuf> {
        let candidates = self.containerfile_candidates();
        candidates
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or_else(|| Error::ContainerfileNotFound {
                uid: self.uid(),
                searched: candidates
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Registries after config → image → version inheritance
    pub fn registries(&self) -> Vec<Registry> {
        let image_registries = self.image.all_registries(&self.config.file().registries);
        self.version.all_registries(&image_registries)
    }

    fn tag_tokens(&self) -> TagTokens {
        TagTokens {
            name: self.image.name.clone(),
            version: self.version.name.clone(),
            os: self.os.map(|o| o.tag_display_name.clone()),
            variant: self.variant.map(|v| v.tag_display_name.clone()),
        }
    }

    /// Rendered tag suffixes, de-duplicated and sorted
    pub fn tag_suffixes(&self) -> Vec<String> {
        let tokens = self.tag_tokens();
        self.tag_patterns
            .iter()
            .flat_map(|p| p.render(&tokens))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Image name as a valid repository path component
    pub fn repository_name(&self) -> String {
        repository_name(&self.image.name)
    }

    /// Fully qualified tags for every registry and suffix
    pub fn tags(&self) -> Vec<String> {
        let suffixes = self.tag_suffixes();
        let repository = self.repository_name();
        self.registries()
            .iter()
            .flat_map(|registry| {
                let base = registry.base_url();
                let name = repository.as_str();
                suffixes
                    .iter()
                    .map(move |suffix| format!("{}/{}:{}", base, name, suffix))
            })
            .collect()
    }

    /// OCI and vendor labels
    pub fn labels(&self) -> BTreeMap<String, String> {
        let repository = &self.config.file().repository;
        let vendor_prefix = repository.label_prefix();

        let mut common: Vec<(&str, String)> = vec![
            (
                "created",
                self.created.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("title", self.image.display_name().to_string()),
            ("version", self.version.name.clone()),
            ("vendor", repository.vendor.clone()),
            ("authors", repository.authors_label()),
            ("source", repository.url.clone()),
        ];
        let revision = self.config.revision();
        if !revision.is_empty() {
            common.push(("revision", revision.to_string()));
        }
        if let Some(description) = &self.image.description {
            common.push(("description", description.clone()));
        }
        if let Some(documentation) = &self.image.documentation_url {
            common.push(("documentation", documentation.clone()));
        }

        let mut labels = BTreeMap::new();
        for (key, value) in common {
            labels.insert(format!("{}.{}", OCI_LABEL_PREFIX, key), value.clone());
            labels.insert(format!("{}.{}", vendor_prefix, key), value);
        }
        if let Some(variant) = self.variant {
            labels.insert(format!("{}.variant", vendor_prefix), variant.name.clone());
        }
        if let Some(os) = self.os {
            labels.insert(format!("{}.os", vendor_prefix), os.name.clone());
        }
        labels
    }

    /// Build arguments pinning each dependency version, e.g. `R_VERSION`
    pub fn build_args(&self) -> BTreeMap<String, String> {
        self.version
            .dependencies
            .iter()
            .filter_map(|d| {
                d.versions.first().map(|v| {
                    (
                        format!("{}_VERSION", d.dependency.to_string().to_uppercase()),
                        v.to_string(),
                    )
                })
            })
            .collect()
    }

    fn tool_option(&self, tool: ToolKind) -> Option<ToolOptions> {
        match self.variant {
            Some(variant) => variant.tool_option(self.image, tool, true),
            None => self.image.tool_option(tool),
        }
    }

    /// Goss options merged variant over image
    pub fn goss_options(&self) -> GossOptions {
        match self.tool_option(ToolKind::Goss) {
            Some(ToolOptions::Goss(options)) => options,
            _ => GossOptions::default(),
        }
    }

    /// Snyk options merged variant over image
    pub fn snyk_options(&self) -> SnykOptions {
        match self.tool_option(ToolKind::Snyk) {
            Some(ToolOptions::Snyk(options)) => options,
            _ => SnykOptions::default(),
        }
    }
}

impl fmt::Display for ImageTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uid())
    }
}
