//! Error types for bakery-core

use thiserror::Error;

/// Result type alias using bakery-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Bakery
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparsable dependency version
    #[error("Invalid version format: {version}")]
    InvalidVersion { version: String },

    /// Contradictory or empty version constraint
    #[error("Invalid version constraint: {message}")]
    InvalidConstraint { message: String },

    /// A constraint selected no versions
    #[error("No versions of {dependency} satisfy constraint {constraint}")]
    EmptyVersionList {
        dependency: String,
        constraint: String,
    },

    /// One or more configuration problems found while validating a node
    #[error("Validation failed for {context}:\n{}", format_errors(.errors))]
    Validation {
        context: String,
        errors: Vec<String>,
    },

    /// No Containerfile candidate exists for a target
    #[error("No Containerfile found for target {uid} (searched: {searched})")]
    ContainerfileNotFound { uid: String, searched: String },

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Failure reported by an external version or release source
    #[error("Version source error: {0:#}")]
    VersionSource(anyhow::Error),
}

fn format_errors(errors: &[String]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create an invalid constraint error
    pub fn invalid_constraint(message: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            message: message.into(),
        }
    }

    /// Create an empty version list error
    pub fn empty_version_list(dependency: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::EmptyVersionList {
            dependency: dependency.into(),
            constraint: constraint.into(),
        }
    }

    /// Create a grouped validation error
    pub fn validation(context: impl Into<String>, errors: Vec<String>) -> Self {
        Self::Validation {
            context: context.into(),
            errors,
        }
    }
}
