//! Configuration file loading and parsing

use crate::error::{Error, Result};
use crate::filter::TargetFilter;
use crate::resolve::{ensure_unique_uids, resolve_targets, Resolver};
use crate::target::ImageTarget;
use crate::types::{BakeryConfigFile, Image};
use crate::utils::git_current_commit_sha;
use crate::validation::{Validate, ValidationReport};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["bakery.yaml", "bakery.yml"];

/// Loaded and validated Bakery configuration
#[derive(Debug, Clone)]
pub struct BakeryConfig {
    /// The parsed configuration
    pub config: BakeryConfigFile,

    /// Path to the configuration file
    pub config_path: Utf8PathBuf,

    /// Build context: the directory holding the configuration file
    pub context: Utf8PathBuf,

    revision: OnceLock<String>,
}

impl BakeryConfig {
    /// Load configuration from the specified path or search for it
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = if let Some(p) = path {
            let content = fs::read_to_string(p).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::config_not_found(p.as_str())
                } else {
                    Error::Io(e)
                }
            })?;
            (p.to_owned(), content)
        } else {
            Self::find_config()?
        };

        let context = config_path
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .map(|p| p.to_owned())
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        info!("Loading configuration from {}", config_path);
        let mut loaded = Self::from_yaml(&content, context)?;
        loaded.config_path = config_path;
        Ok(loaded)
    }

    /// Parse and validate configuration text for a given build context
    pub fn from_yaml(content: &str, context: impl Into<Utf8PathBuf>) -> Result<Self> {
        let context = context.into();
        let mut config: BakeryConfigFile = serde_yaml_ng::from_str(content)?;

        let config_path = context.join(CONFIG_FILE_NAMES[0]);
        let mut report = ValidationReport::new();
        config.validate(config_path.as_str(), &mut report);
        debug!(
            "Validated {} images with {} warnings",
            config.images.len(),
            report.warnings().len()
        );
        report.into_result(config_path.as_str())?;

        Ok(Self {
            config,
            config_path,
            context,
            revision: OnceLock::new(),
        })
    }

    /// Find configuration file in current directory or parent directories
    fn find_config() -> Result<(Utf8PathBuf, String)> {
        let cwd = std::env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        let mut current = cwd.as_path();

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok((path, content));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(
            "bakery.yaml (searched current and parent directories)",
        ))
    }

    pub fn file(&self) -> &BakeryConfigFile {
        &self.config
    }

    pub fn context(&self) -> &Utf8Path {
        &self.context
    }

    pub fn images(&self) -> &[Image] {
        &self.config.images
    }

    /// Revision label: the configured one, else the context's git HEAD
    pub fn revision(&self) -> &str {
        self.revision.get_or_init(|| {
            self.config
                .repository
                .revision
                .clone()
                .unwrap_or_else(|| git_current_commit_sha(&self.context))
        })
    }

    /// Materialize development, matrix and dependency versions of every image
    pub fn materialize(&mut self, resolver: &Resolver<'_>) -> Result<()> {
        for image in &mut self.config.images {
            resolver.materialize(image)?;
        }
        Ok(())
    }

    /// Targets of every image, checked for uid collisions
    pub fn targets(&self) -> Result<Vec<ImageTarget<'_>>> {
        let targets: Vec<ImageTarget<'_>> = self
            .config
            .images
            .iter()
            .flat_map(|image| resolve_targets(self, image))
            .collect();
        ensure_unique_uids(&targets)?;
        Ok(targets)
    }

    /// Targets of every image that pass `filter`
    pub fn filtered_targets(&self, filter: &TargetFilter) -> Result<Vec<ImageTarget<'_>>> {
        let targets = self.targets()?;
        let total = targets.len();
        let selected = filter.apply(targets);
        debug!("Filter selected {} of {} targets", selected.len(), total);
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
images:
  - name: demo
    versions:
      - name: "1.0.0"
        os:
          - name: Ubuntu 22.04
"#;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = utf8(&dir).join("bakery.yaml");
        fs::write(&path, MINIMAL).unwrap();

        let config = BakeryConfig::load(Some(&path)).unwrap();
        assert_eq!(config.config_path, path);
        assert_eq!(config.context(), utf8(&dir));
        assert_eq!(config.images().len(), 1);
        // Single OS was promoted during validation
        assert!(config.images()[0].versions[0].os[0].primary);
    }

    #[test]
    fn test_load_missing_path() {
        let err = BakeryConfig::load(Some(Utf8Path::new("/nonexistent/bakery.yaml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        fs::write(root.join("bakery.yml"), MINIMAL).unwrap();
        let nested = root.join("demo").join("1.0.0");
        fs::create_dir_all(&nested).unwrap();

        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(&nested).unwrap();
        let result = BakeryConfig::load(None);
        std::env::set_current_dir(original).unwrap();

        let config = result.unwrap();
        assert!(config.config_path.ends_with("bakery.yml"));
    }

    #[test]
    fn test_validation_errors_are_grouped() {
        let yaml = r#"
images:
  - name: demo
    variants:
      - name: Standard
        primary: true
      - name: Minimal
        primary: true
    versions:
      - name: "1.0.0"
        extraRegistries: [{host: docker.io, namespace: a}]
        overrideRegistries: [{host: ghcr.io, namespace: b}]
"#;
        let err = BakeryConfig::from_yaml(yaml, "/ctx").unwrap_err();
        match err {
            Error::Validation { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_uids_rejected() {
        // Both names slugify to the same uid
        let yaml = r#"
images:
  - name: demo
    versions:
      - name: "1.0"
        os: [{name: Ubuntu 22.04}]
      - name: "1-0"
        os: [{name: Ubuntu 22.04}]
"#;
        let config = BakeryConfig::from_yaml(yaml, "/ctx").unwrap();
        let err = config.targets().unwrap_err();
        assert!(err.to_string().contains("demo-1-0-ubuntu-22-04"));
    }

    #[test]
    fn test_explicit_revision_skips_git() {
        let yaml = "repository:\n  revision: deadbeef\nimages: []\n";
        let config = BakeryConfig::from_yaml(yaml, "/ctx").unwrap();
        assert_eq!(config.revision(), "deadbeef");
    }
}
