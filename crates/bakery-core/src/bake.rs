//! Docker Buildx bake plan generation
//!
//! The plan is a bake file in JSON form: a `group` map of target names and
//! a `target` map describing how to build each one. Sorted maps keep the
//! output stable between runs.

use crate::error::{Error, Result};
use crate::target::ImageTarget;
use crate::utils::slugify;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use tracing::debug;

/// Group every target belongs to
pub const DEFAULT_GROUP: &str = "default";

/// Prefix of per-variant groups, keeping them apart from image groups
pub const VARIANT_GROUP_PREFIX: &str = "variant-";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakeGroup {
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakeTarget {
    pub context: String,
    /// Containerfile path relative to `context`
    pub dockerfile: String,
    pub labels: BTreeMap<String, String>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, String>,
}

/// A complete bake file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakePlan {
    pub group: BTreeMap<String, BakeGroup>,
    pub target: BTreeMap<String, BakeTarget>,
}

impl BakePlan {
    /// Build a plan for `targets` relative to the build context
    ///
    /// Fails if any target has no Containerfile.
    pub fn from_targets(context: &Utf8Path, targets: &[ImageTarget<'_>]) -> Result<Self> {
        let mut plan = BakePlan::default();
        let mut owners = BTreeMap::new();
        owners.insert(DEFAULT_GROUP.to_string(), "every target".to_string());
        plan.group.entry(DEFAULT_GROUP.to_string()).or_default();

        for target in targets {
            let uid = target.uid();
            let containerfile = target.containerfile()?;
            let dockerfile = containerfile
                .strip_prefix(context)
                .map(|p| p.to_string())
                .unwrap_or_else(|_| containerfile.to_string());

            plan.add_to_group(DEFAULT_GROUP, &uid);
            let image_group = slugify(target.image_name());
            let image_owner = format!("image '{}'", target.image_name());
            claim_group(&mut owners, &image_group, image_owner)?;
            plan.add_to_group(&image_group, &uid);
            if let Some(variant) = target.variant {
                let variant_group =
                    format!("{}{}", VARIANT_GROUP_PREFIX, slugify(&variant.name));
                let variant_owner = format!("variant '{}'", variant.name);
                claim_group(&mut owners, &variant_group, variant_owner)?;
                plan.add_to_group(&variant_group, &uid);
            }

            debug!("Adding bake target {} ({})", uid, dockerfile);
            plan.target.insert(
                uid,
                BakeTarget {
                    context: context.to_string(),
                    dockerfile,
                    labels: target.labels(),
                    tags: target.tags(),
                    args: target.build_args(),
                },
            );
        }

        Ok(plan)
    }

    fn add_to_group(&mut self, group: &str, uid: &str) {
        let entry = self.group.entry(group.to_string()).or_default();
        if !entry.targets.iter().any(|t| t == uid) {
            entry.targets.push(uid.to_string());
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the plan as JSON, creating parent directories
    pub fn write(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        debug!("Wrote bake plan with {} targets to {}", self.target.len(), path);
        Ok(())
    }
}

/// Fail when two different owners map to the same group name
fn claim_group(owners: &mut BTreeMap<String, String>, group: &str, owner: String) -> Result<()> {
    match owners.get(group) {
        Some(existing) if *existing != owner => Err(Error::invalid_config(format!(
            "Bake group '{}' is claimed by both {} and {}",
            group, existing, owner
        ))),
        Some(_) => Ok(()),
        None => {
            owners.insert(group.to_string(), owner);
            Ok(())
        }
    }
}
