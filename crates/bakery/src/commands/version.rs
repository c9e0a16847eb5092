//! Version command

use crate::cli::VersionArgs;
use crate::output;
use crate::version::VersionInfo;
use anyhow::Result;

pub fn run(args: VersionArgs) -> Result<()> {
    let mut info = VersionInfo::current();
    if args.tools {
        info = info.with_tools();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", info.display());
    if args.tools {
        output::kv("version sources", &info.version_sources.join(", "));
        for tool in &info.tools {
            output::kv(&tool.name, tool.path.as_deref().unwrap_or("not found"));
        }
        let missing = info.missing_tools();
        if !missing.is_empty() {
            output::warning(&format!("Not on PATH: {}", missing.join(", ")));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::version::{ToolStatus, VersionInfo};

    #[test]
    fn test_version_info_current_is_valid_semver() {
        let info = VersionInfo::current();
        assert!(
            semver::Version::parse(&info.version).is_ok(),
            "version should be valid semver, got: {}",
            info.version
        );
        assert_eq!(info.version_sources, vec!["python", "R", "quarto"]);
        assert!(info.tools.is_empty());
    }

    #[test]
    fn test_display_with_and_without_commit() {
        let mut info = VersionInfo::current();
        info.version = "1.2.3".to_string();
        info.commit = Some("abc1234".to_string());
        assert_eq!(info.display(), "bakery 1.2.3 (abc1234)");
        assert_eq!(format!("{}", info), info.display());

        info.commit = None;
        assert_eq!(info.display(), "bakery 1.2.3");
    }

    #[test]
    fn test_with_tools_probes_every_driven_tool() {
        let info = VersionInfo::current().with_tools();
        let names: Vec<&str> = info.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["docker", "dgoss", "snyk"]);
    }

    #[test]
    fn test_missing_tools() {
        let mut info = VersionInfo::current();
        info.tools = vec![
            ToolStatus {
                name: "docker".to_string(),
                path: Some("/usr/bin/docker".to_string()),
            },
            ToolStatus::probe("bakery-no-such-tool"),
        ];
        assert_eq!(info.missing_tools(), vec!["bakery-no-such-tool"]);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["tools"][1]["path"], serde_json::Value::Null);
        assert_eq!(json["versionSources"][1], "R");
    }
}
