//! Per-tool options with field-level inheritance
//!
//! Options are declared on images and variants. A variant's option for a
//! tool is merged over its image's option for the same tool: every field the
//! variant sets wins, every field it leaves unset falls back to the image.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default seconds to wait before running goss tests
pub const DEFAULT_GOSS_WAIT: u32 = 0;

/// Default command keeping the container alive during goss tests
pub const DEFAULT_GOSS_COMMAND: &str = "sleep infinity";

/// Tools that accept options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Goss,
    Snyk,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolKind::Goss => write!(f, "goss"),
            ToolKind::Snyk => write!(f, "snyk"),
        }
    }
}

/// Options for the dgoss test driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GossOptions {
    /// Seconds to wait for the container before testing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<u32>,

    /// Command the container runs while tests execute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Extra `docker run` flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_options: Option<String>,
}

impl GossOptions {
    pub fn wait(&self) -> u32 {
        self.wait.unwrap_or(DEFAULT_GOSS_WAIT)
    }

    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or(DEFAULT_GOSS_COMMAND)
    }
}

/// Options for the snyk scan driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnykOptions {
    /// Minimum severity reported (low, medium, high, critical)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_threshold: Option<String>,

    /// Also scan application dependencies inside the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_vulns: Option<bool>,
}

/// Options for one tool, tagged by tool name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum ToolOptions {
    Goss(GossOptions),
    Snyk(SnykOptions),
}

/// Field-by-field override where the receiver's set fields win
pub trait MergeOptions {
    fn merge_over(&self, parent: &Self) -> Self;
}

impl MergeOptions for GossOptions {
    fn merge_over(&self, parent: &Self) -> Self {
        Self {
            wait: self.wait.or(parent.wait),
            command: self.command.clone().or_else(|| parent.command.clone()),
            runtime_options: self
                .runtime_options
                .clone()
                .or_else(|| parent.runtime_options.clone()),
        }
    }
}

impl MergeOptions for SnykOptions {
    fn merge_over(&self, parent: &Self) -> Self {
        Self {
            severity_threshold: self
                .severity_threshold
                .clone()
                .or_else(|| parent.severity_threshold.clone()),
            app_vulns: self.app_vulns.or(parent.app_vulns),
        }
    }
}

impl ToolOptions {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolOptions::Goss(_) => ToolKind::Goss,
            ToolOptions::Snyk(_) => ToolKind::Snyk,
        }
    }

    /// Merge over a parent option of the same tool; mismatched tools keep self
    pub fn merge_over(&self, parent: &ToolOptions) -> ToolOptions {
        match (self, parent) {
            (ToolOptions::Goss(own), ToolOptions::Goss(p)) => ToolOptions::Goss(own.merge_over(p)),
            (ToolOptions::Snyk(own), ToolOptions::Snyk(p)) => ToolOptions::Snyk(own.merge_over(p)),
            _ => self.clone(),
        }
    }
}

/// Find the option for `tool` in a node's own list
pub fn find_option(options: &[ToolOptions], tool: ToolKind) -> Option<&ToolOptions> {
    options.iter().find(|o| o.kind() == tool)
}

/// Resolve a node's option for `tool`, optionally merged with its parent's
///
/// `parent` is the already-resolved option of the parent node.
pub fn resolve_option(
    own: &[ToolOptions],
    parent: Option<ToolOptions>,
    tool: ToolKind,
) -> Option<ToolOptions> {
    match (find_option(own, tool), parent) {
        (Some(own), Some(parent)) => Some(own.merge_over(&parent)),
        (Some(own), None) => Some(own.clone()),
        (None, parent) => parent,
    }
}
