//! `docker buildx bake` driver

use crate::command::{find_tool, CommandOutput, ToolCommand};
use crate::error::{Result, ToolError};
use bakery_core::BakePlan;
use camino::Utf8Path;
use tracing::info;

pub const DOCKER: &str = "docker";

/// Options for a bake run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeOptions {
    /// Push images after building
    pub push: bool,

    /// Load images into the local image store
    pub load: bool,

    /// Builder instance to use
    pub builder: Option<String>,

    /// Only build these targets or groups; empty builds the default group
    pub targets: Vec<String>,
}

impl BakeOptions {
    pub fn validate(&self) -> Result<()> {
        if self.push && self.load {
            return Err(ToolError::invalid_options(
                "buildx",
                "--push and --load cannot be combined",
            ));
        }
        Ok(())
    }
}

/// Command line for baking the plan at `plan_path`
pub fn bake_command(plan_path: &Utf8Path, options: &BakeOptions) -> Result<ToolCommand> {
    options.validate()?;

    let mut cmd = ToolCommand::new(DOCKER)
        .args(["buildx", "bake"])
        .arg("--file")
        .arg(plan_path.as_str());
    if let Some(builder) = &options.builder {
        cmd = cmd.arg("--builder").arg(builder);
    }
    if options.push {
        cmd = cmd.arg("--push");
    }
    if options.load {
        cmd = cmd.arg("--load");
    }
    Ok(cmd.args(options.targets.iter().cloned()))
}

/// Write `plan` to `plan_path` and bake it
pub async fn bake(
    plan: &BakePlan,
    plan_path: &Utf8Path,
    options: &BakeOptions,
) -> Result<CommandOutput> {
    let cmd = bake_command(plan_path, options)?;
    find_tool(DOCKER)?;

    plan.write(plan_path)?;
    info!("Baking {} targets from {}", plan.target.len(), plan_path);
    cmd.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bake_command() {
        let options = BakeOptions {
            push: true,
            builder: Some("ci".to_string()),
            targets: vec!["demo".to_string()],
            ..Default::default()
        };
        let cmd = bake_command(Utf8Path::new("/tmp/plan.json"), &options).unwrap();
        assert_eq!(
            cmd.display(),
            "docker buildx bake --file /tmp/plan.json --builder ci --push demo"
        );
    }

    #[test]
    fn test_default_bakes_everything() {
        let cmd = bake_command(Utf8Path::new("plan.json"), &BakeOptions::default()).unwrap();
        assert_eq!(cmd.get_args(), ["buildx", "bake", "--file", "plan.json"]);
    }

    #[test]
    fn test_push_and_load_conflict() {
        let options = BakeOptions {
            push: true,
            load: true,
            ..Default::default()
        };
        assert!(matches!(
            bake_command(Utf8Path::new("plan.json"), &options),
            Err(ToolError::InvalidOptions { .. })
        ));
    }
}
