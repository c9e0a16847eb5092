//! Scan command

use super::Session;
use crate::cli::ScanArgs;
use crate::output::{self, Outcome};
use anyhow::Result;
use bakery_tools::{group_failures, run_all, snyk, SnykReport};
use camino::Utf8Path;

fn severity_summary(report: &SnykReport) -> String {
    report
        .severity_counts()
        .iter()
        .map(|(severity, count)| format!("{} {}", count, severity))
        .collect::<Vec<_>>()
        .join(", ")
}

fn outcome(report: &SnykReport) -> Outcome {
    if report.vulnerabilities.is_empty() {
        Outcome::Passed("no vulnerabilities".to_string())
    } else {
        Outcome::Flagged(format!(
            "{} vulnerabilities ({})",
            report.vulnerabilities.len(),
            severity_summary(report)
        ))
    }
}

/// Run snyk against every selected target
pub async fn run(args: ScanArgs, config: Option<&Utf8Path>) -> Result<()> {
    let session = Session::load(config, &args.filter).await?;
    let targets = session.targets()?;
    if targets.is_empty() {
        return Ok(());
    }

    let spinner = output::spinner(&format!("Scanning {} targets...", targets.len()));
    let results = run_all(&targets, snyk::test).await;
    spinner.finish_and_clear();

    output::target_results("Scan results", &results, outcome);

    if args.fail_on_vulnerabilities {
        group_failures(&results, SnykReport::check)?;
    } else {
        group_failures(&results, |_| Ok(()))?;
    }
    Ok(())
}
