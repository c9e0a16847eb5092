//! Images and their variants

use super::dev::DevVersion;
use super::matrix::ImageMatrix;
use super::version::ImageVersion;
use crate::options::{find_option, resolve_option, ToolKind, ToolOptions};
use crate::registry::{Registry, RegistryOverrides};
use crate::tags::{default_tag_patterns, TagPattern};
use crate::utils::{extension_slug, tag_slug};
use crate::validation::{
    dedup_with_warning, promote_single_primary, require_single_primary, require_unique,
    Primary, Validate, ValidationReport,
};
use crate::version::DependencyConstraint;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A build flavor of an image, e.g. Standard or Minimal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageVariant {
    pub name: String,

    #[serde(default)]
    pub primary: bool,

    /// Containerfile suffix
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extension: String,

    /// Tag token
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag_display_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_patterns: Vec<TagPattern>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ToolOptions>,
}

impl ImageVariant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Fill in `extension` and `tagDisplayName` when unset
    pub fn apply_defaults(&mut self) {
        let conventional = match self.name.trim().to_lowercase().as_str() {
            "standard" => Some("std"),
            "minimal" => Some("min"),
            _ => None,
        };
        if self.extension.is_empty() {
            self.extension = conventional
                .map(str::to_string)
                .unwrap_or_else(|| extension_slug(&self.name));
        }
        if self.tag_display_name.is_empty() {
            self.tag_display_name = conventional
                .map(str::to_string)
                .unwrap_or_else(|| tag_slug(&self.name));
        }
    }

    /// Option for `tool`, merged field-by-field over the image's when asked
    pub fn tool_option(
        &self,
        image: &Image,
        tool: ToolKind,
        merge_with_parent: bool,
    ) -> Option<ToolOptions> {
        let parent = if merge_with_parent {
            image.tool_option(tool)
        } else {
            None
        };
        resolve_option(&self.options, parent, tool)
    }
}

impl Primary for ImageVariant {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_primary(&self) -> bool {
        self.primary
    }

    fn set_primary(&mut self, primary: bool) {
        self.primary = primary;
    }
}

/// A configured container image family
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: String,

    /// Human readable name used for the title label
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,

    /// Directory under the context; defaults to `name`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subpath: String,

    #[serde(flatten)]
    pub registries: RegistryOverrides,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_patterns: Vec<TagPattern>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_constraints: Vec<DependencyConstraint>,

    #[serde(default)]
    pub variants: Vec<ImageVariant>,

    #[serde(default)]
    pub versions: Vec<ImageVersion>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dev_versions: Vec<DevVersion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<ImageMatrix>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ToolOptions>,

    /// Free-form values exposed to templates
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, serde_json::Value>,
}

impl Image {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Label used in validation messages
    pub fn context_label(&self) -> String {
        format!("image '{}'", self.name)
    }

    pub fn display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    pub fn subpath(&self) -> &str {
        if self.subpath.is_empty() {
            &self.name
        } else {
            &self.subpath
        }
    }

    /// Image directory under the build context
    pub fn path(&self, context: &Utf8Path) -> Utf8PathBuf {
        context.join(self.subpath())
    }

    /// Registries of this image given the config-level registries
    pub fn all_registries(&self, root: &[Registry]) -> Vec<Registry> {
        self.registries.resolve(root)
    }

    pub fn version(&self, name: &str) -> Option<&ImageVersion> {
        self.versions.iter().find(|v| v.name == name)
    }

    pub fn primary_variant(&self) -> Option<&ImageVariant> {
        self.variants.iter().find(|v| v.primary)
    }

    /// The image's own option for `tool`
    pub fn tool_option(&self, tool: ToolKind) -> Option<ToolOptions> {
        find_option(&self.options, tool).cloned()
    }

    /// Tag patterns for a variant: its own followed by the image's
    ///
    /// Falls back to the built-in defaults when neither declares any.
    pub fn tag_patterns_for(&self, variant: Option<&ImageVariant>) -> Vec<TagPattern> {
        let mut patterns: Vec<TagPattern> = Vec::new();
        let own = variant.map(|v| v.tag_patterns.as_slice()).unwrap_or_default();
        for pattern in own.iter().chain(self.tag_patterns.iter()) {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }
        if patterns.is_empty() {
            default_tag_patterns()
        } else {
            patterns
        }
    }

    /// Whether any source of versions is configured
    pub fn has_version_sources(&self) -> bool {
        !self.versions.is_empty() || !self.dev_versions.is_empty() || self.matrix.is_some()
    }
}

impl Validate for Image {
    fn validate(&mut self, context: &str, report: &mut ValidationReport) {
        if self.name.trim().is_empty() {
            report.error("An image is missing a name");
        }

        if !self.has_version_sources() {
            report.warn(format!(
                "No versions, devVersions or matrix defined for {}",
                context
            ));
        }

        for variant in &mut self.variants {
            if variant.name.trim().is_empty() {
                report.error(format!("A variant in {} is missing a name", context));
            }
            variant.apply_defaults();
        }

        dedup_with_warning(
            &mut self.registries.extra_registries,
            |r| r.base_url(),
            "registry",
            context,
            report,
        );
        dedup_with_warning(
            &mut self.registries.override_registries,
            |r| r.base_url(),
            "registry",
            context,
            report,
        );
        dedup_with_warning(
            &mut self.tag_patterns,
            |p| p.patterns.join(", "),
            "tag pattern",
            context,
            report,
        );

        require_unique(&self.versions, |v| v.name.clone(), "version", context, report);
        require_unique(&self.variants, |v| v.name.clone(), "variant", context, report);
        require_unique(
            &self.dependency_constraints,
            |c| c.dependency,
            "dependency constraint",
            context,
            report,
        );
        if self.registries.is_conflicting() {
            report.error(format!(
                "Only one of 'extraRegistries' or 'overrideRegistries' may be defined for {}",
                context
            ));
        }
        for constraint in &self.dependency_constraints {
            report.check(
                &format!("{} dependency constraint for {}", context, constraint.dependency),
                constraint.constraint.validate(),
            );
        }

        promote_single_primary(&mut self.variants);
        require_single_primary(&self.variants, "variant", context, report);

        for version in &mut self.versions {
            let version_context = format!("{} version '{}'", context, version.name);
            version.validate(&version_context, report);
        }
        for dev in &mut self.dev_versions {
            dev.validate(&format!("{} devVersion", context), report);
        }
        if let Some(matrix) = &mut self.matrix {
            matrix.validate(&format!("{} matrix", context), report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GossOptions;
    use crate::tags::TagFilter;

    fn goss(wait: Option<u32>, command: Option<&str>) -> ToolOptions {
        ToolOptions::Goss(GossOptions {
            wait,
            command: command.map(str::to_string),
            runtime_options: None,
        })
    }

    #[test]
    fn test_variant_defaults() {
        let mut std = ImageVariant::new("Standard");
        std.apply_defaults();
        assert_eq!(std.extension, "std");
        assert_eq!(std.tag_display_name, "std");

        let mut other = ImageVariant::new("GPU Enabled");
        other.apply_defaults();
        assert_eq!(other.extension, "gpuenabled");
        assert_eq!(other.tag_display_name, "gpu-enabled");
    }

    #[test]
    fn test_variant_option_merges_over_image() {
        let mut image = Image::new("demo");
        image.options = vec![goss(Some(10), Some("/init"))];
        let mut variant = ImageVariant::new("Minimal");
        variant.options = vec![goss(Some(30), None)];

        let merged = variant.tool_option(&image, ToolKind::Goss, true).unwrap();
        assert_eq!(merged, goss(Some(30), Some("/init")));

        let own = variant.tool_option(&image, ToolKind::Goss, false).unwrap();
        assert_eq!(own, goss(Some(30), None));
        assert!(variant.tool_option(&image, ToolKind::Snyk, true).is_none());
    }

    #[test]
    fn test_tag_patterns_variant_first_then_image() {
        let mut image = Image::new("demo");
        let shared = TagPattern::new(["{{ Version }}"], &[TagFilter::All]);
        image.tag_patterns = vec![shared.clone()];
        let mut variant = ImageVariant::new("Standard");
        variant.tag_patterns = vec![
            TagPattern::new(["{{ Version }}-{{ Variant }}"], &[TagFilter::All]),
            shared.clone(),
        ];
        let patterns = image.tag_patterns_for(Some(&variant));
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[1], shared);
    }

    #[test]
    fn test_tag_patterns_default_when_none_declared() {
        let image = Image::new("demo");
        assert_eq!(image.tag_patterns_for(None), default_tag_patterns());
    }

    #[test]
    fn test_paths_and_names() {
        let mut image = Image::new("workbench");
        assert_eq!(image.display_name(), "workbench");
        assert_eq!(
            image.path(Utf8Path::new("/ctx")),
            Utf8PathBuf::from("/ctx/workbench")
        );
        image.subpath = "images/wb".to_string();
        image.display_name = "Workbench".to_string();
        assert_eq!(image.display_name(), "Workbench");
        assert_eq!(
            image.path(Utf8Path::new("/ctx")),
            Utf8PathBuf::from("/ctx/images/wb")
        );
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let yaml = r#"
name: demo
extraRegistries: [{host: docker.io, namespace: a}]
overrideRegistries: [{host: ghcr.io, namespace: b}]
variants:
  - name: Standard
    primary: true
  - name: Minimal
    primary: true
versions:
  - name: "1.0.0"
  - name: "1.0.0"
"#;
        let mut image: Image = serde_yaml_ng::from_str(yaml).unwrap();
        let mut report = ValidationReport::new();
        image.validate(&image.context_label(), &mut report);
        let errors = report.errors().join("\n");
        assert!(errors.contains("Duplicate version '1.0.0'"));
        assert!(errors.contains("extraRegistries' or 'overrideRegistries'"));
        assert!(errors.contains("Only one variant may be marked primary"));
    }

    #[test]
    fn test_missing_versions_is_only_a_warning() {
        let mut image = Image::new("empty");
        let mut report = ValidationReport::new();
        image.validate("image 'empty'", &mut report);
        assert!(!report.has_errors());
        assert_eq!(report.warnings().len(), 1);
    }
}
