//! Error types for bakery-tools

use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias using bakery-tools's error type
pub type Result<T> = std::result::Result<T, ToolError>;

/// Captured output kept in errors is cut to this many characters
pub const MAX_OUTPUT_CHARS: usize = 2000;

/// Tool driver error types
#[derive(Error, Debug)]
pub enum ToolError {
    /// Executable not found in PATH
    #[error("{tool} not found in PATH. Please ensure it is installed")]
    NotFound { tool: String },

    /// Process could not be started
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Process ran and exited unsuccessfully
    #[error("{tool} failed with exit code {}: {command}\n{stderr}", format_exit_code(exit_code))]
    CommandFailed {
        tool: String,
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Options that cannot be combined
    #[error("Invalid {tool} options: {message}")]
    InvalidOptions { tool: String, message: String },

    /// Tool output could not be understood
    #[error("Failed to parse {tool} report: {message}")]
    ReportParse { tool: String, message: String },

    /// goss ran and some tests failed
    #[error("{failed} of {total} goss tests failed")]
    TestsFailed { failed: u64, total: u64 },

    /// snyk reported vulnerabilities and the caller treats them as failures
    #[error("{count} vulnerabilities found")]
    VulnerabilitiesFound { count: usize },

    /// A target has nothing to run against
    #[error("Target {uid} has no tags")]
    NoTags { uid: String },

    /// Failures of a batch run, keyed by target uid
    #[error("{count} target(s) failed:\n{}", format_failures(failures))]
    Group {
        count: usize,
        failures: BTreeMap<String, String>,
    },

    /// Core error
    #[error(transparent)]
    Core(#[from] bakery_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

fn format_failures(failures: &BTreeMap<String, String>) -> String {
    failures
        .iter()
        .map(|(uid, message)| format!("  {}: {}", uid, message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Last `max` characters of `text`
pub fn truncate_output(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - max).collect();
    format!("...{}", tail)
}

impl ToolError {
    pub fn not_found(tool: impl Into<String>) -> Self {
        Self::NotFound { tool: tool.into() }
    }

    pub fn invalid_options(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn report_parse(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReportParse {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Failure of a finished process, keeping the tail of its output
    pub fn command_failed(
        tool: impl Into<String>,
        command: impl Into<String>,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            command: command.into(),
            exit_code,
            stdout: truncate_output(stdout, MAX_OUTPUT_CHARS),
            stderr: truncate_output(stderr, MAX_OUTPUT_CHARS),
        }
    }

    /// Group per-target failures; `None` when there are none
    pub fn group(failures: BTreeMap<String, String>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self::Group {
                count: failures.len(),
                failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate_output("short", 10), "short");
        let long = format!("{}END", "x".repeat(3000));
        let cut = truncate_output(&long, MAX_OUTPUT_CHARS);
        assert!(cut.starts_with("..."));
        assert!(cut.ends_with("END"));
        assert_eq!(cut.chars().count(), MAX_OUTPUT_CHARS + 3);
    }

    #[test]
    fn test_command_failed_truncates() {
        let err = ToolError::command_failed("dgoss", "dgoss run x", Some(1), "", &"e".repeat(5000));
        match err {
            ToolError::CommandFailed { stderr, .. } => {
                assert_eq!(stderr.chars().count(), MAX_OUTPUT_CHARS + 3)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_group() {
        assert!(ToolError::group(BTreeMap::new()).is_none());
        let err = ToolError::group(BTreeMap::from([
            ("b".to_string(), "boom".to_string()),
            ("a".to_string(), "bang".to_string()),
        ]))
        .unwrap();
        let message = err.to_string();
        assert!(message.starts_with("2 target(s) failed"));
        assert!(message.find("a: bang").unwrap() < message.find("b: boom").unwrap());
    }
}
