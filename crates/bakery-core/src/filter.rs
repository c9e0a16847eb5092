//! Target selection by name and development status

use crate::error::{Error, Result};
use crate::target::ImageTarget;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How development versions are treated by a filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevVersionInclusion {
    Include,
    #[default]
    Exclude,
    Only,
}

impl FromStr for DevVersionInclusion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            "only" => Ok(Self::Only),
            other => Err(Error::invalid_config(format!(
                "Unknown dev version mode '{}' (expected include, exclude or only)",
                other
            ))),
        }
    }
}

impl fmt::Display for DevVersionInclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Include => write!(f, "include"),
            Self::Exclude => write!(f, "exclude"),
            Self::Only => write!(f, "only"),
        }
    }
}

/// Regular-expression filters over target names
#[derive(Debug, Clone, Default)]
pub struct TargetFilter {
    pub image_name: Option<Regex>,
    pub image_version: Option<Regex>,
    pub variant: Option<Regex>,
    pub os: Option<Regex>,
    pub dev_versions: DevVersionInclusion,
}

fn compile(field: &str, pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|e| {
                Error::invalid_config(format!("Invalid {} filter '{}': {}", field, p, e))
            })
        })
        .transpose()
}

fn matches(filter: &Option<Regex>, value: Option<&str>) -> bool {
    match (filter, value) {
        (None, _) => true,
        (Some(re), Some(value)) => re.is_match(value),
        (Some(_), None) => false,
    }
}

impl TargetFilter {
    /// Build a filter from optional pattern strings
    pub fn new(
        image_name: Option<&str>,
        image_version: Option<&str>,
        variant: Option<&str>,
        os: Option<&str>,
        dev_versions: DevVersionInclusion,
    ) -> Result<Self> {
        Ok(Self {
            image_name: compile("image name", image_name)?,
            image_version: compile("image version", image_version)?,
            variant: compile("variant", variant)?,
            os: compile("os", os)?,
            dev_versions,
        })
    }

    pub fn matches(&self, target: &ImageTarget<'_>) -> bool {
        let dev_ok = match self.dev_versions {
            DevVersionInclusion::Include => true,
            DevVersionInclusion::Exclude => !target.is_development_version(),
            DevVersionInclusion::Only => target.is_development_version(),
        };
        dev_ok
            && matches(&self.image_name, Some(target.image_name()))
            && matches(&self.image_version, Some(&target.version.name))
            && matches(&self.variant, target.variant.map(|v| v.name.as_str()))
            && matches(&self.os, target.os.map(|o| o.name.as_str()))
    }

    pub fn apply<'a>(&self, targets: Vec<ImageTarget<'a>>) -> Vec<ImageTarget<'a>> {
        targets.into_iter().filter(|t| self.matches(t)).collect()
    }
}
