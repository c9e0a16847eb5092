//! # bakery-tools
//!
//! Process drivers for the tools Bakery orchestrates:
//! - [`buildx`]: `docker buildx bake` over a written bake plan
//! - [`goss`]: `dgoss run` against a built image, with report parsing
//! - [`snyk`]: `snyk container test` against a built image
//!
//! Drivers locate their executable with `which` before running and report
//! failures as [`ToolError`]. [`batch::run_all`] runs a driver over many
//! targets concurrently without stopping at the first failure.

pub mod batch;
pub mod buildx;
pub mod command;
pub mod error;
pub mod goss;
pub mod snyk;

pub use batch::{group_failures, run_all, TargetResult};
pub use buildx::BakeOptions;
pub use command::{find_tool, tool_exists, CommandOutput, ToolCommand};
pub use error::{Result, ToolError};
pub use goss::GossReport;
pub use snyk::SnykReport;

/// Executables driven by bakery, in build, test, scan order
pub const TOOLS: [&str; 3] = [buildx::DOCKER, goss::DGOSS, snyk::SNYK];
