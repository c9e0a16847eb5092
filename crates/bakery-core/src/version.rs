//! Dependency versions and version constraints
//!
//! A [`DependencyVersion`] is a loosely-specified semantic version ("4", "4.4",
//! "4.4.3") that remembers how precisely it was written. A
//! [`VersionConstraint`] selects a subset of candidate versions.

use crate::error::{Error, Result};
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::trace;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?$").expect("version regex is valid")
});

/// Dependencies whose versions can be constrained per image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dependency {
    #[serde(rename = "python", alias = "Python")]
    Python,
    #[serde(rename = "R", alias = "r")]
    R,
    #[serde(rename = "quarto", alias = "Quarto")]
    Quarto,
}

impl Dependency {
    /// All known dependencies
    pub const ALL: [Dependency; 3] = [Dependency::Python, Dependency::R, Dependency::Quarto];
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dependency::Python => "python",
            Dependency::R => "R",
            Dependency::Quarto => "quarto",
        };
        write!(f, "{}", name)
    }
}

/// A parsed dependency version
///
/// Ordering and equality only consider `(major, minor, patch)`; missing
/// components count as zero, so "1.4" and "1.4.0" compare equal while still
/// reporting different precision through [`has_minor`](Self::has_minor) and
/// [`has_micro`](Self::has_micro).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DependencyVersion {
    version: Version,
    has_minor: bool,
    has_micro: bool,
}

impl DependencyVersion {
    /// Parse a version string such as "4", "4.4" or "v4.4.3"
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let caps = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| Error::invalid_version(input))?;

        let component = |idx: usize| -> Result<Option<u64>> {
            caps.get(idx)
                .map(|m| {
                    m.as_str()
                        .parse::<u64>()
                        .map_err(|_| Error::invalid_version(input))
                })
                .transpose()
        };

        let major = component(1)?.unwrap_or(0);
        let minor = component(2)?;
        let micro = component(3)?;

        Ok(Self {
            version: Version::new(major, minor.unwrap_or(0), micro.unwrap_or(0)),
            has_minor: minor.is_some(),
            has_micro: micro.is_some(),
        })
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    pub fn minor(&self) -> u64 {
        self.version.minor
    }

    pub fn patch(&self) -> u64 {
        self.version.patch
    }

    /// Whether the source string specified a minor component
    pub fn has_minor(&self) -> bool {
        self.has_minor
    }

    /// Whether the source string specified a micro/patch component
    pub fn has_micro(&self) -> bool {
        self.has_micro
    }

    /// Compare against a bound only as precisely as the bound was written.
    ///
    /// `4.4.3` matches bound `4.4` and bound `4` exactly (returns `Equal`).
    fn cmp_to_bound(&self, bound: &DependencyVersion) -> Ordering {
        let ours = (
            self.major(),
            if bound.has_minor { self.minor() } else { 0 },
            if bound.has_micro { self.patch() } else { 0 },
        );
        ours.cmp(&(bound.major(), bound.minor(), bound.patch()))
    }
}

impl PartialEq for DependencyVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DependencyVersion {}

impl Hash for DependencyVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major(), self.minor(), self.patch()).hash(state);
    }
}

impl PartialOrd for DependencyVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DependencyVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major(), self.minor(), self.patch()).cmp(&(other.major(), other.minor(), other.patch()))
    }
}

impl fmt::Display for DependencyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major())?;
        if self.has_minor {
            write!(f, ".{}", self.minor())?;
        }
        if self.has_micro {
            write!(f, ".{}", self.patch())?;
        }
        Ok(())
    }
}

impl FromStr for DependencyVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DependencyVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DependencyVersion> for String {
    fn from(value: DependencyVersion) -> Self {
        value.to_string()
    }
}

/// Selection rule over a list of candidate versions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionConstraint {
    /// Take the single highest version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<bool>,

    /// Take the N highest versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// Inclusive lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,

    /// Inclusive upper bound, compared only as precisely as written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

impl VersionConstraint {
    /// Constraint selecting only the latest version
    pub fn latest() -> Self {
        Self {
            latest: Some(true),
            ..Default::default()
        }
    }

    /// Constraint selecting the `n` highest versions
    pub fn count(n: usize) -> Self {
        Self {
            count: Some(n),
            ..Default::default()
        }
    }

    fn is_latest(&self) -> bool {
        self.latest.unwrap_or(false)
    }

    /// Check the mutual-exclusivity rules between fields
    pub fn validate(&self) -> Result<()> {
        if self.is_latest() && (self.min.is_some() || self.max.is_some()) {
            return Err(Error::invalid_constraint(
                "'latest' cannot be combined with 'min' or 'max'",
            ));
        }
        if self.count.is_some() && self.min.is_some() && self.max.is_some() {
            return Err(Error::invalid_constraint(
                "'count' cannot be combined with both 'min' and 'max'",
            ));
        }
        if self.count == Some(0) {
            return Err(Error::invalid_constraint("'count' must be greater than 0"));
        }
        if !self.is_latest() && self.count.is_none() && self.min.is_none() && self.max.is_none()
        {
            return Err(Error::invalid_constraint(
                "at least one of 'latest', 'count', 'min' or 'max' must be set",
            ));
        }
        if let Some(min) = &self.min {
            DependencyVersion::parse(min)?;
        }
        if let Some(max) = &self.max {
            DependencyVersion::parse(max)?;
        }
        Ok(())
    }

    /// Number of versions to keep after range filtering, if limited
    fn take(&self) -> Option<usize> {
        match (self.count, self.is_latest()) {
            (Some(n), _) => Some(n),
            (None, true) => Some(1),
            (None, false) => None,
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(latest) = self.latest {
            parts.push(format!("latest={}", latest));
        }
        if let Some(count) = self.count {
            parts.push(format!("count={}", count));
        }
        if let Some(min) = &self.min {
            parts.push(format!("min={}", min));
        }
        if let Some(max) = &self.max {
            parts.push(format!("max={}", max));
        }
        write!(f, "{}", parts.join(","))
    }
}

/// Resolve a constraint against candidate versions
///
/// Candidates are sorted highest-first, filtered to the inclusive `min`/`max`
/// range, then truncated to `count` (or 1 when only `latest` is set).
pub fn resolve_versions(
    constraint: &VersionConstraint,
    candidates: &[DependencyVersion],
) -> Result<Vec<DependencyVersion>> {
    constraint.validate()?;

    let min = constraint
        .min
        .as_deref()
        .map(DependencyVersion::parse)
        .transpose()?;
    let max = constraint
        .max
        .as_deref()
        .map(DependencyVersion::parse)
        .transpose()?;

    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| b.cmp(a));
    sorted.dedup();

    let mut selected: Vec<DependencyVersion> = sorted
        .into_iter()
        .filter(|v| {
            let above_min = min.as_ref().is_none_or(|m| v >= m);
            let below_max = max
                .as_ref()
                .is_none_or(|m| v.cmp_to_bound(m) != Ordering::Greater);
            if !(above_min && below_max) {
                trace!("Version {} outside range {}", v, constraint);
            }
            above_min && below_max
        })
        .collect();

    if let Some(n) = constraint.take() {
        selected.truncate(n);
    }

    if selected.is_empty() {
        return Err(Error::empty_version_list("dependency", constraint.to_string()));
    }

    Ok(selected)
}

/// Constraint attached to one dependency of an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyConstraint {
    pub dependency: Dependency,
    pub constraint: VersionConstraint,
}

impl DependencyConstraint {
    /// Resolve this constraint, labelling failures with the dependency name
    pub fn resolve(&self, candidates: &[DependencyVersion]) -> Result<DependencyVersions> {
        let versions = resolve_versions(&self.constraint, candidates).map_err(|e| match e {
            Error::EmptyVersionList { constraint, .. } => {
                Error::empty_version_list(self.dependency.to_string(), constraint)
            }
            other => other,
        })?;
        Ok(DependencyVersions {
            dependency: self.dependency,
            versions,
        })
    }
}

/// Concrete versions of one dependency pinned to an image version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyVersions {
    pub dependency: Dependency,
    pub versions: Vec<DependencyVersion>,
}
