//! CLI argument parsing with clap

use bakery_core::{DevVersionInclusion, TargetFilter};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Bakery - build, test and scan container image families
#[derive(Parser, Debug)]
#[command(name = "bakery")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to bakery.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// List resolved image targets
    Targets(TargetsArgs),

    /// Print or write the buildx bake plan
    Plan(PlanArgs),

    /// Render version templates
    Render(RenderArgs),

    /// Build targets with docker buildx bake
    Build(BuildArgs),

    /// Test built targets with dgoss
    Test(TestArgs),

    /// Scan built targets with snyk
    Scan(ScanArgs),
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Also report where docker, dgoss and snyk are found on PATH
    #[arg(long)]
    pub tools: bool,
}

/// Target selection shared by every target command
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only image names matching this regular expression
    #[arg(long, value_name = "REGEX")]
    pub image_name: Option<String>,

    /// Only versions matching this regular expression
    #[arg(long, value_name = "REGEX")]
    pub image_version: Option<String>,

    /// Only variants matching this regular expression
    #[arg(long, value_name = "REGEX")]
    pub variant: Option<String>,

    /// Only operating systems matching this regular expression
    #[arg(long, value_name = "REGEX")]
    pub os: Option<String>,

    /// Whether development versions are included (include, exclude, only)
    #[arg(long, default_value_t = DevVersionInclusion::Exclude)]
    pub dev_versions: DevVersionInclusion,
}

impl FilterArgs {
    pub fn to_filter(&self) -> bakery_core::Result<TargetFilter> {
        TargetFilter::new(
            self.image_name.as_deref(),
            self.image_version.as_deref(),
            self.variant.as_deref(),
            self.os.as_deref(),
            self.dev_versions,
        )
    }

    /// Development versions must be resolved for this selection
    pub fn needs_dev_versions(&self) -> bool {
        self.dev_versions != DevVersionInclusion::Exclude
    }
}

#[derive(Args, Debug)]
pub struct TargetsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Write the plan to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Push images to their registries
    #[arg(long, conflicts_with = "load")]
    pub push: bool,

    /// Load images into the local image store
    #[arg(long)]
    pub load: bool,

    /// Buildx builder instance
    #[arg(long)]
    pub builder: Option<String>,

    /// Keep the rendered directories of development versions
    #[arg(long)]
    pub keep_rendered: bool,
}

#[derive(Args, Debug)]
pub struct TestArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Fail when any vulnerability is reported
    #[arg(long)]
    pub fail_on_vulnerabilities: bool,
}
