//! Dependency matrix images
//!
//! A matrix expands the cartesian product of its dependency versions into
//! one synthetic version per combination, all sharing a single directory.

use super::version::{validate_os_and_registries, ImageVersion, ImageVersionOs};
use crate::error::{Error, Result};
use crate::registry::RegistryOverrides;
use crate::resolve::VersionCatalog;
use crate::validation::{require_unique, Validate, ValidationReport};
use crate::version::{DependencyConstraint, DependencyVersions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_MATRIX_SUBPATH: &str = "matrix";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMatrix {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subpath: String,

    #[serde(flatten)]
    pub registries: RegistryOverrides,

    #[serde(default)]
    pub os: Vec<ImageVersionOs>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependency_constraints: Vec<DependencyConstraint>,

    /// Explicitly pinned dependency versions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyVersions>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, serde_json::Value>,
}

impl ImageMatrix {
    pub fn subpath(&self) -> &str {
        if self.subpath.is_empty() {
            DEFAULT_MATRIX_SUBPATH
        } else {
            &self.subpath
        }
    }

    /// Explicit dependencies followed by constraint-resolved ones
    pub fn resolve_dependencies(
        &self,
        catalog: &dyn VersionCatalog,
    ) -> Result<Vec<DependencyVersions>> {
        let mut resolved = self.dependencies.clone();
        for constraint in &self.dependency_constraints {
            let candidates = catalog.available_versions(constraint.dependency)?;
            resolved.push(constraint.resolve(&candidates)?);
        }
        Ok(resolved)
    }

    /// One version per combination of dependency versions
    pub fn materialize(&self, catalog: &dyn VersionCatalog) -> Result<Vec<ImageVersion>> {
        let dependencies = self.resolve_dependencies(catalog)?;

        let mut combinations: Vec<Vec<DependencyVersions>> = vec![Vec::new()];
        for dependency in &dependencies {
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    dependency.versions.iter().map(move |version| {
                        let mut next = prefix.clone();
                        next.push(DependencyVersions {
                            dependency: dependency.dependency,
                            versions: vec![version.clone()],
                        });
                        next
                    })
                })
                .collect();
        }

        let versions = combinations
            .into_iter()
            .filter(|pinned| !pinned.is_empty())
            .map(|pinned| {
                let name = pinned
                    .iter()
                    .map(|d| format!("{}{}", d.dependency, d.versions[0]))
                    .collect::<Vec<_>>()
                    .join("-");
                ImageVersion {
                    name,
                    subpath: self.subpath().to_string(),
                    registries: self.registries.clone(),
                    os: self.os.clone(),
                    dependencies: pinned,
                    values: self.values.clone(),
                    ..Default::default()
                }
            })
            .collect::<Vec<_>>();

        if versions.is_empty() {
            return Err(Error::empty_version_list("matrix", "no dependency versions"));
        }

        Ok(versions)
    }
}

impl Validate for ImageMatrix {
    fn validate(&mut self, context: &str, report: &mut ValidationReport) {
        validate_os_and_registries(&mut self.os, &mut self.registries, context, report);

        if self.dependencies.is_empty() && self.dependency_constraints.is_empty() {
            report.error(format!(
                "A matrix needs 'dependencies' or 'dependencyConstraints' in {}",
                context
            ));
        }

        let declared: Vec<_> = self
            .dependencies
            .iter()
            .map(|d| d.dependency)
            .chain(self.dependency_constraints.iter().map(|c| c.dependency))
            .collect();
        require_unique(&declared, |d| *d, "dependency", context, report);

        for pinned in self.dependencies.iter().filter(|d| d.versions.is_empty()) {
            report.error(format!(
                "Dependency {} in {} lists no versions",
                pinned.dependency, context
            ));
        }

        for constraint in &self.dependency_constraints {
            report.check(
                &format!("{} dependency constraint for {}", context, constraint.dependency),
                constraint.constraint.validate(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{Dependency, DependencyVersion};

    struct Catalog;

    impl VersionCatalog for Catalog {
        fn available_versions(&self, dependency: Dependency) -> Result<Vec<DependencyVersion>> {
            let list: &[&str] = match dependency {
                Dependency::Python => &["3.13.2", "3.12.9", "3.11.11"],
                Dependency::R => &["4.5.1", "4.4.3"],
                Dependency::Quarto => &["1.7.32"],
            };
            list.iter().map(|v| DependencyVersion::parse(v)).collect()
        }
    }

    fn matrix(yaml: &str) -> ImageMatrix {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn test_cartesian_product_names() {
        let m = matrix(
            r#"
dependencies:
  - dependency: R
    versions: ["4.5.1", "4.4.3"]
dependencyConstraints:
  - dependency: python
    constraint: {count: 2}
os:
  - name: Ubuntu 24.04
"#,
        );
        let versions = m.materialize(&Catalog).unwrap();
        let names: Vec<&str> = versions.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "R4.5.1-python3.13.2",
                "R4.5.1-python3.12.9",
                "R4.4.3-python3.13.2",
                "R4.4.3-python3.12.9",
            ]
        );
        assert!(versions.iter().all(|v| v.subpath == "matrix"));
        assert!(versions.iter().all(|v| v.dependencies.len() == 2));
        assert!(versions.iter().all(|v| !v.latest && !v.ephemeral));
    }

    #[test]
    fn test_empty_constraint_result_is_error() {
        let m = matrix(
            r#"
dependencyConstraints:
  - dependency: R
    constraint: {min: "5.0"}
"#,
        );
        let err = m.materialize(&Catalog).unwrap_err();
        assert!(err.to_string().contains("R"));
    }

    #[test]
    fn test_validation_requires_dependencies() {
        let mut m = matrix("os: [{name: Ubuntu 22.04}]\n");
        let mut report = ValidationReport::new();
        m.validate("image 'demo' matrix", &mut report);
        assert!(report.has_errors());
        assert!(report.errors()[0].contains("matrix"));
    }

    #[test]
    fn test_duplicate_dependency_across_lists() {
        let mut m = matrix(
            r#"
dependencies:
  - dependency: R
    versions: ["4.5.1"]
dependencyConstraints:
  - dependency: R
    constraint: {latest: true}
"#,
        );
        let mut report = ValidationReport::new();
        m.validate("image 'demo' matrix", &mut report);
        assert!(report
            .errors()
            .iter()
            .any(|e| e.contains("Duplicate dependency 'R'")));
    }

    const EMPTY_PINNED: &str = r#"
dependencies:
  - dependency: R
    versions: []
os:
  - name: Ubuntu 24.04
"#;

    #[test]
    fn test_pinned_dependency_without_versions_is_rejected() {
        let mut m = matrix(EMPTY_PINNED);
        let mut report = ValidationReport::new();
        m.validate("image 'demo' matrix", &mut report);
        assert_eq!(
            report.errors(),
            ["Dependency R in image 'demo' matrix lists no versions"]
        );
    }

    #[test]
    fn test_empty_product_is_error() {
        let err = matrix(EMPTY_PINNED).materialize(&Catalog).unwrap_err();
        assert!(matches!(err, Error::EmptyVersionList { .. }));
    }
}
