//! Upstream version lists per dependency
//!
//! Each dependency has one URL and one response format. Parsing keeps only
//! final releases, skips version strings that do not parse, and returns the
//! list sorted newest first without duplicates.

use anyhow::{anyhow, Context, Result};
use bakery_core::{Dependency, DependencyVersion};
use serde::Deserialize;
use tracing::trace;

pub const PYTHON_RELEASES_URL: &str =
    "https://www.python.org/api/v2/downloads/release/?is_published=true";
pub const R_VERSIONS_URL: &str = "https://cdn.posit.co/r/versions.json";
pub const QUARTO_RELEASES_URL: &str =
    "https://api.github.com/repos/quarto-dev/quarto-cli/releases?per_page=100";

/// URL listing the versions of `dependency`
pub fn versions_url(dependency: Dependency) -> &'static str {
    match dependency {
        Dependency::Python => PYTHON_RELEASES_URL,
        Dependency::R => R_VERSIONS_URL,
        Dependency::Quarto => QUARTO_RELEASES_URL,
    }
}

#[derive(Debug, Deserialize)]
struct PythonRelease {
    name: String,
    #[serde(default)]
    pre_release: bool,
}

#[derive(Debug, Deserialize)]
struct RVersions {
    r_versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
}

fn parse_all<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<DependencyVersion> {
    let mut versions: Vec<DependencyVersion> = raw
        .filter_map(|v| match DependencyVersion::parse(v) {
            Ok(version) => Some(version),
            Err(_) => {
                trace!("Skipping unparsable version '{}'", v);
                None
            }
        })
        .collect();
    versions.sort_by(|a, b| b.cmp(a));
    versions.dedup();
    versions
}

/// Parse a version list response for `dependency`
///
/// A response that yields no versions is an error.
pub fn parse_versions(dependency: Dependency, body: &str) -> Result<Vec<DependencyVersion>> {
    let versions = match dependency {
        Dependency::Python => {
            let releases: Vec<PythonRelease> =
                serde_json::from_str(body).context("Failed to parse Python release list")?;
            parse_all(
                releases
                    .iter()
                    .filter(|r| !r.pre_release)
                    .map(|r| r.name.trim_start_matches("Python").trim()),
            )
        }
        Dependency::R => {
            let list: RVersions =
                serde_json::from_str(body).context("Failed to parse R version list")?;
            parse_all(list.r_versions.iter().map(String::as_str))
        }
        Dependency::Quarto => {
            let releases: Vec<GithubRelease> =
                serde_json::from_str(body).context("Failed to parse Quarto release list")?;
            parse_all(
                releases
                    .iter()
                    .filter(|r| !r.prerelease && !r.draft)
                    .map(|r| r.tag_name.as_str()),
            )
        }
    };

    if versions.is_empty() {
        return Err(anyhow!("No {} versions found in response", dependency));
    }
    Ok(versions)
}
