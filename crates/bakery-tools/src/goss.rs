//! `dgoss` test driver
//!
//! Each target is started with `dgoss run` using its first tag. Test files
//! are taken from the `test/` directory of the target's version directory,
//! and goss writes a JSON report to stdout which is parsed into a
//! [`GossReport`].

use crate::command::{find_tool, ToolCommand};
use crate::error::{Result, ToolError};
use bakery_core::ImageTarget;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DGOSS: &str = "dgoss";

/// Directory under a version holding goss files
pub const TEST_DIR: &str = "test";

/// Options passed to goss through `GOSS_OPTS`
pub const GOSS_OPTS: &str = "--format json --no-color";

/// Totals of a goss run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GossSummary {
    pub failed_count: u64,
    pub test_count: u64,
    #[serde(default)]
    pub skipped_count: u64,
    /// Nanoseconds
    #[serde(default)]
    pub total_duration: u64,
}

/// One checked property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GossResult {
    pub resource_type: String,
    pub resource_id: String,
    #[serde(default)]
    pub property: String,
    pub successful: bool,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub summary_line: String,
}

/// Parsed `--format json` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GossReport {
    #[serde(default)]
    pub results: Vec<GossResult>,
    pub summary: GossSummary,
}

impl GossReport {
    pub fn passed(&self) -> bool {
        self.summary.failed_count == 0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.summary.total_duration)
    }

    pub fn failures(&self) -> impl Iterator<Item = &GossResult> {
        self.results.iter().filter(|r| !r.successful && !r.skipped)
    }

    /// Error when any test failed
    pub fn check(&self) -> Result<()> {
        if self.passed() {
            Ok(())
        } else {
            Err(ToolError::TestsFailed {
                failed: self.summary.failed_count,
                total: self.summary.test_count,
            })
        }
    }
}

/// Parse the JSON report out of dgoss stdout
///
/// dgoss may print progress lines before the report, so parsing starts at
/// the first `{`.
pub fn parse_report(stdout: &str) -> Result<GossReport> {
    let start = stdout
        .find('{')
        .ok_or_else(|| ToolError::report_parse("goss", "no JSON object in output"))?;
    let mut stream =
        serde_json::Deserializer::from_str(&stdout[start..]).into_iter::<GossReport>();
    match stream.next() {
        Some(Ok(report)) => Ok(report),
        Some(Err(e)) => Err(ToolError::report_parse("goss", e.to_string())),
        None => Err(ToolError::report_parse("goss", "empty output")),
    }
}

/// Command line testing `target`
pub fn goss_command(target: &ImageTarget<'_>) -> Result<ToolCommand> {
    let tag = target
        .tags()
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::NoTags { uid: target.uid() })?;
    let options = target.goss_options();
    let files = target.version_path().join(TEST_DIR);

    let mut cmd = ToolCommand::new(DGOSS)
        .arg("run")
        .env("GOSS_FILES_PATH", files.as_str())
        .env("GOSS_OPTS", GOSS_OPTS)
        .env("GOSS_SLEEP", options.wait().to_string());
    if let Some(runtime) = &options.runtime_options {
        cmd = cmd.args(runtime.split_whitespace().map(str::to_string));
    }
    Ok(cmd
        .arg(tag)
        .args(options.command().split_whitespace().map(str::to_string)))
}

/// Run dgoss against `target`
///
/// A report with failed tests is still returned; use [`GossReport::check`]
/// to turn it into an error.
pub async fn run(target: &ImageTarget<'_>) -> Result<GossReport> {
    let cmd = goss_command(target)?;
    find_tool(DGOSS)?;

    let test_dir = target.version_path().join(TEST_DIR);
    if !test_dir.is_dir() {
        warn!("{} has no {} directory at {}", target, TEST_DIR, test_dir);
    }

    info!("Testing {}", target);
    let output = cmd.output().await?;
    match parse_report(&output.stdout) {
        Ok(report) => {
            debug!(
                "{}: {} tests, {} failed in {:?}",
                target,
                report.summary.test_count,
                report.summary.failed_count,
                report.duration()
            );
            Ok(report)
        }
        Err(_) if !output.success() => Err(cmd.failure(&output)),
        Err(e) => Err(e),
    }
}
