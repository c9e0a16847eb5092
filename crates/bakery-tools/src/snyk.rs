//! `snyk container test` driver
//!
//! snyk exits 0 when nothing was found and 1 when vulnerabilities were
//! found; both produce a JSON report. Any other exit code is a failure.

use crate::command::{find_tool, ToolCommand};
use crate::error::{Result, ToolError};
use bakery_core::ImageTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const SNYK: &str = "snyk";

/// Accepted values of `severityThreshold`
pub const SEVERITIES: [&str; 4] = ["low", "medium", "high", "critical"];

/// A reported vulnerability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnykVulnerability {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub severity: String,
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub version: String,
}

/// Parsed `--json` output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnykReport {
    pub ok: bool,
    #[serde(default)]
    pub vulnerabilities: Vec<SnykVulnerability>,
    #[serde(default)]
    pub unique_count: u64,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnykOutput {
    One(SnykReport),
    Many(Vec<SnykReport>),
}

impl SnykReport {
    /// Vulnerability counts per severity
    pub fn severity_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for vuln in &self.vulnerabilities {
            *counts.entry(vuln.severity.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Error when any vulnerability was reported
    pub fn check(&self) -> Result<()> {
        if self.vulnerabilities.is_empty() {
            Ok(())
        } else {
            Err(ToolError::VulnerabilitiesFound {
                count: self.vulnerabilities.len(),
            })
        }
    }

    fn merge(reports: Vec<SnykReport>) -> SnykReport {
        let mut merged = SnykReport {
            ok: true,
            ..Default::default()
        };
        for report in reports {
            merged.ok &= report.ok;
            merged.unique_count += report.unique_count;
            merged.vulnerabilities.extend(report.vulnerabilities);
            if merged.error.is_none() {
                merged.error = report.error;
            }
        }
        merged.summary = format!("{} vulnerable paths", merged.vulnerabilities.len());
        merged
    }
}

/// Parse snyk JSON output, merging multi-project output into one report
pub fn parse_report(stdout: &str) -> Result<SnykReport> {
    let output: SnykOutput = serde_json::from_str(stdout.trim())
        .map_err(|e| ToolError::report_parse("snyk", e.to_string()))?;
    Ok(match output {
        SnykOutput::One(report) => report,
        SnykOutput::Many(reports) => SnykReport::merge(reports),
    })
}

/// Command line scanning `target`
pub fn scan_command(target: &ImageTarget<'_>) -> Result<ToolCommand> {
    let tag = target
        .tags()
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::NoTags { uid: target.uid() })?;
    let containerfile = target.containerfile()?;
    let options = target.snyk_options();

    let mut cmd = ToolCommand::new(SNYK)
        .args(["container", "test"])
        .arg(tag)
        .arg("--json")
        .arg(format!("--file={}", containerfile));
    if let Some(threshold) = &options.severity_threshold {
        if !SEVERITIES.contains(&threshold.as_str()) {
            return Err(ToolError::invalid_options(
                SNYK,
                format!(
                    "severityThreshold '{}' must be one of: {}",
                    threshold,
                    SEVERITIES.join(", ")
                ),
            ));
        }
        cmd = cmd.arg(format!("--severity-threshold={}", threshold));
    }
    if options.app_vulns == Some(true) {
        cmd = cmd.arg("--app-vulns");
    }
    Ok(cmd)
}

/// Scan `target`; a report listing vulnerabilities is a successful scan
pub async fn test(target: &ImageTarget<'_>) -> Result<SnykReport> {
    let cmd = scan_command(target)?;
    find_tool(SNYK)?;

    info!("Scanning {}", target);
    let output = cmd.output().await?;
    match output.exit_code {
        Some(0) | Some(1) => {
            let report = parse_report(&output.stdout)?;
            debug!(
                "{}: {} vulnerabilities",
                target,
                report.vulnerabilities.len()
            );
            Ok(report)
        }
        _ => Err(cmd.failure(&output)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single() {
        let report = parse_report(
            r#"{
              "ok": false,
              "uniqueCount": 2,
              "summary": "3 vulnerable dependency paths",
              "vulnerabilities": [
                {"id": "SNYK-1", "title": "Overflow", "severity": "high", "packageName": "zlib", "version": "1.2"},
                {"id": "SNYK-2", "severity": "low", "packageName": "tar"},
                {"id": "SNYK-2", "severity": "low", "packageName": "tar"}
              ]
            }"#,
        )
        .unwrap();
        assert!(!report.ok);
        assert_eq!(report.unique_count, 2);
        let counts = report.severity_counts();
        assert_eq!(counts["high"], 1);
        assert_eq!(counts["low"], 2);
        assert!(matches!(
            report.check(),
            Err(ToolError::VulnerabilitiesFound { count: 3 })
        ));
    }

    #[test]
    fn test_parse_multi_project() {
        let report = parse_report(
            r#"[
              {"ok": true, "vulnerabilities": []},
              {"ok": false, "uniqueCount": 1, "vulnerabilities": [{"id": "SNYK-3", "severity": "medium"}]}
            ]"#,
        )
        .unwrap();
        assert!(!report.ok);
        assert_eq!(report.vulnerabilities.len(), 1);
        assert_eq!(report.unique_count, 1);
    }

    #[test]
    fn test_parse_error_output() {
        let report = parse_report(r#"{"ok": false, "error": "Authentication failed"}"#).unwrap();
        assert_eq!(report.error.as_deref(), Some("Authentication failed"));
        assert!(parse_report("not json").is_err());
    }
}
