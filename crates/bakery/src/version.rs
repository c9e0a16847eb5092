//! Build and environment metadata reported by `bakery version`

use bakery_core::Dependency;
use serde::{Deserialize, Serialize};

/// An external executable bakery drives, and where it was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub name: String,

    /// Resolved path; `None` when the tool is not on PATH
    pub path: Option<String>,
}

impl ToolStatus {
    pub fn probe(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: bakery_tools::find_tool(name)
                .ok()
                .map(|p| p.display().to_string()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Version information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,

    /// Git commit SHA (short), set by the build script
    pub commit: Option<String>,

    /// Dependencies whose versions can be fetched for constraints
    pub version_sources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolStatus>,
}

impl VersionInfo {
    /// Create version info for current build
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("GIT_SHA").map(String::from),
            version_sources: Dependency::ALL.iter().map(|d| d.to_string()).collect(),
            tools: Vec::new(),
        }
    }

    /// Attach the PATH lookup of every driven tool
    pub fn with_tools(mut self) -> Self {
        self.tools = bakery_tools::TOOLS
            .iter()
            .map(|tool| ToolStatus::probe(tool))
            .collect();
        self
    }

    pub fn missing_tools(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter(|t| !t.is_available())
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Format as display string
    pub fn display(&self) -> String {
        match &self.commit {
            Some(commit) => format!("bakery {} ({})", self.version, commit),
            None => format!("bakery {}", self.version),
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
