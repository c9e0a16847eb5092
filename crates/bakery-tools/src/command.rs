//! External process execution shared by the drivers

use crate::error::{Result, ToolError};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, warn};

/// Locate `tool` in PATH
pub fn find_tool(tool: &str) -> Result<PathBuf> {
    match which::which(tool) {
        Ok(path) => {
            debug!("Found {} at: {}", tool, path.display());
            Ok(path)
        }
        Err(_) => Err(ToolError::not_found(tool)),
    }
}

/// Check if a tool is available in PATH
pub fn tool_exists(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A command line to run, built up before execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    current_dir: Option<Utf8PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Utf8Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_owned());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Shell-like rendering for logs and errors
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("'{}'", part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion and capture output, whatever the exit status
    pub async fn output(&self) -> Result<CommandOutput> {
        debug!("Running: {}", self.display());

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env).kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|source| ToolError::Spawn {
            tool: self.program.clone(),
            source,
        })?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run and fail on a non-zero exit
    pub async fn run(&self) -> Result<CommandOutput> {
        let output = self.output().await?;
        if !output.success() {
            warn!(
                "Command failed: {}\nStderr: {}",
                self.display(),
                output.stderr.trim()
            );
            return Err(self.failure(&output));
        }
        Ok(output)
    }

    /// Error describing `output` of this command
    pub fn failure(&self, output: &CommandOutput) -> ToolError {
        ToolError::command_failed(
            &self.program,
            self.display(),
            output.exit_code,
            &output.stdout,
            &output.stderr,
        )
    }
}
