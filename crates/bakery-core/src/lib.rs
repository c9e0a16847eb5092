//! # bakery-core
//!
//! Core library for the Bakery CLI providing:
//! - Configuration file parsing (bakery.yaml) and validation
//! - Dependency versions and version constraints
//! - Registry, tag pattern and tool option inheritance
//! - OS normalization against a static catalog
//! - Expansion of images into a flat list of build targets
//! - Buildx bake plan generation and version template rendering

pub mod bake;
pub mod config;
pub mod error;
pub mod filter;
pub mod options;
pub mod os;
pub mod registry;
pub mod resolve;
pub mod tags;
pub mod target;
pub mod templates;
pub mod types;
pub mod utils;
pub mod validation;
pub mod version;

pub use bake::{BakeGroup, BakePlan, BakeTarget};
pub use config::{BakeryConfig, RuntimeSettings};
pub use error::{Error, Result};
pub use filter::{DevVersionInclusion, TargetFilter};
pub use os::{normalize_os, BuildOs, OsFamily};
pub use options::{GossOptions, SnykOptions, ToolKind, ToolOptions};
pub use registry::Registry;
pub use resolve::{
    ensure_unique_uids, resolve_targets, NoVersionSources, ReleaseStreams, Resolver,
    StreamRelease, VersionCatalog,
};
pub use tags::{TagFilter, TagPattern};
pub use target::ImageTarget;
pub use templates::{cleanup_ephemeral, render_version};
pub use types::{
    BakeryConfigFile, DevVersion, DevVersionSource, Image, ImageMatrix, ImageVariant, ImageVersion,
    ImageVersionOs, Repository,
};
pub use version::{
    resolve_versions, Dependency, DependencyConstraint, DependencyVersion, DependencyVersions,
    VersionConstraint,
};
