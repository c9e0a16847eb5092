//! Image versions and the operating systems they are built on

use crate::os::{normalize_os, BuildOs};
use crate::registry::{Registry, RegistryOverrides};
use crate::utils::{extension_slug, tag_slug};
use crate::validation::{
    dedup_with_warning, promote_single_primary, require_single_primary, require_unique,
    warn_if_empty, Primary, Validate, ValidationReport,
};
use crate::version::{Dependency, DependencyVersions};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// An operating system a version is built for
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageVersionOs {
    /// Free text name, e.g. "Ubuntu 22.04"
    pub name: String,

    #[serde(default)]
    pub primary: bool,

    /// Containerfile suffix; defaults to a compact slug of `name`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extension: String,

    /// Tag token; defaults to a dotted slug of `name`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag_display_name: String,

    /// Normalized OS; derived from `name` when not given
    #[serde(default, rename = "buildOS", skip_serializing_if = "Option::is_none")]
    pub build_os: Option<BuildOs>,

    #[serde(
        default,
        rename = "artifactDownloadURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub artifact_download_url: Option<String>,
}

impl ImageVersionOs {
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

    /// Fill in derived fields left empty by the user
    pub fn apply_defaults(&mut self) {
        if self.extension.is_empty() {
            self.extension = extension_slug(&self.name);
        }
        if self.tag_display_name.is_empty() {
            self.tag_display_name = tag_slug(&self.name);
        }
        if self.build_os.is_none() {
            self.build_os = Some(normalize_os(&self.name));
        }
    }

    /// Normalized OS, falling back to the unknown sentinel
    pub fn build_os(&self) -> BuildOs {
        self.build_os.clone().unwrap_or_else(BuildOs::unknown)
    }
}

impl PartialEq for ImageVersionOs {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.extension == other.extension
            && self.tag_display_name == other.tag_display_name
    }
}

impl Eq for ImageVersionOs {}

impl Hash for ImageVersionOs {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.extension.hash(state);
        self.tag_display_name.hash(state);
    }
}

impl Primary for ImageVersionOs {
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

/// A concrete version of an image, built for one or more operating systems
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageVersion {
    pub name: String,

    /// Directory under the image path; defaults to `name` with spaces replaced
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subpath: String,

    #[serde(flatten)]
    pub registries: RegistryOverrides,

    #[serde(default)]
    pub latest: bool,

    /// Rendered only for the current invocation and removed afterwards
    #[serde(skip)]
    pub ephemeral: bool,

    #[serde(skip)]
    pub is_development_version: bool,

    #[serde(default)]
    pub os: Vec<ImageVersionOs>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyVersions>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, serde_json::Value>,
}

impl ImageVersion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Directory holding this version's Containerfiles and tests
    pub fn path(&self, image_path: &Utf8Path) -> Utf8PathBuf {
        image_path.join(self.subpath())
    }

    pub fn subpath(&self) -> String {
        if self.subpath.is_empty() {
            self.name.replace(' ', "-")
        } else {
            self.subpath.clone()
        }
    }

    /// Registries this version publishes to, given its image's registries
    pub fn all_registries(&self, image_registries: &[Registry]) -> Vec<Registry> {
        self.registries.resolve(image_registries)
    }

    pub fn primary_os(&self) -> Option<&ImageVersionOs> {
        self.os.iter().find(|o| o.primary)
    }

    /// Pinned versions of one dependency, if any
    pub fn dependency_versions(&self, dependency: Dependency) -> Option<&DependencyVersions> {
        self.dependencies.iter().find(|d| d.dependency == dependency)
    }
}

/// Shared checks for anything owning an OS list and registry settings
pub(crate) fn validate_os_and_registries(
    os: &mut Vec<ImageVersionOs>,
    registries: &mut RegistryOverrides,
    context: &str,
    report: &mut ValidationReport,
) {
    for entry in os.iter_mut() {
        if entry.name.trim().is_empty() {
            report.error(format!("An OS in {} is missing a name", context));
        }
        entry.apply_defaults();
    }

    warn_if_empty(os, "operating systems", context, report);

    dedup_with_warning(os, |o| o.name.clone(), "OS", context, report);
    dedup_with_warning(
        &mut registries.extra_registries,
        |r| r.base_url(),
        "registry",
        context,
        report,
    );
    dedup_with_warning(
        &mut registries.override_registries,
        |r| r.base_url(),
        "registry",
        context,
        report,
    );

    if registries.is_conflicting() {
        report.error(format!(
            "Only one of 'extraRegistries' or 'overrideRegistries' may be defined for {}",
            context
        ));
    }

    promote_single_primary(os);
    require_single_primary(os, "OS", context, report);
}

impl Validate for ImageVersion {
    fn validate(&mut self, context: &str, report: &mut ValidationReport) {
        if self.name.trim().is_empty() {
            report.error(format!("A version in {} is missing a name", context));
        }

        validate_os_and_registries(&mut self.os, &mut self.registries, context, report);

        require_unique(
            &self.dependencies,
            |d| d.dependency,
            "dependency",
            context,
            report,
        );
    }
}
