//! Development versions
//!
//! A development version is not written in the config by number. Its
//! version string comes from the environment or from a product release
//! stream at resolution time, and it is rendered into a hidden ephemeral
//! directory that is removed after use.

use super::version::{validate_os_and_registries, ImageVersion, ImageVersionOs};
use crate::error::{Error, Result};
use crate::registry::RegistryOverrides;
use crate::resolve::ReleaseStreams;
use crate::validation::{Validate, ValidationReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Where a development version's number comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "sourceType",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum DevVersionSource {
    /// Read from environment variables
    Env {
        version_env: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url_env: Option<String>,
    },
    /// Looked up from a product release stream
    Stream { product: String, channel: String },
}

/// A development version entry of an image
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevVersion {
    #[serde(flatten)]
    pub source: DevVersionSource,

    #[serde(default)]
    pub os: Vec<ImageVersionOs>,

    #[serde(flatten)]
    pub registries: RegistryOverrides,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, serde_json::Value>,
}

fn read_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::invalid_config(format!(
            "Environment variable {} is not set; it is required by a development version",
            name
        ))),
    }
}

impl DevVersion {
    /// Resolve the version number and build the synthetic version it stands for
    pub fn materialize(&self, streams: &dyn ReleaseStreams) -> Result<ImageVersion> {
        let mut os = self.os.clone();
        for entry in os.iter_mut() {
            entry.apply_defaults();
        }

        let version = match &self.source {
            DevVersionSource::Env {
                version_env,
                url_env,
            } => {
                let version = read_env(version_env)?;
                if let Some(url_env) = url_env {
                    let url = read_env(url_env)?;
                    for entry in os.iter_mut() {
                        entry.artifact_download_url = Some(url.clone());
                    }
                }
                version
            }
            DevVersionSource::Stream { product, channel } => {
                let release = streams.release(product, channel)?;
                for entry in os.iter_mut() {
                    if entry.artifact_download_url.is_none() {
                        entry.artifact_download_url = release
                            .downloads
                            .get(&entry.extension)
                            .or_else(|| release.downloads.get(&entry.tag_display_name))
                            .cloned();
                    }
                }
                release.version
            }
        };

        debug!("Resolved development version {}", version);

        Ok(ImageVersion {
            name: version.clone(),
            subpath: format!(".dev-{}", version.replace(' ', "-")),
            registries: self.registries.clone(),
            latest: false,
            ephemeral: true,
            is_development_version: true,
            os,
            dependencies: Vec::new(),
            values: self.values.clone(),
        })
    }
}

impl Validate for DevVersion {
    fn validate(&mut self, context: &str, report: &mut ValidationReport) {
        match &self.source {
            DevVersionSource::Env { version_env, .. } if version_env.trim().is_empty() => {
                report.error(format!("'versionEnv' must not be empty in {}", context));
            }
            DevVersionSource::Stream { product, channel }
                if product.trim().is_empty() || channel.trim().is_empty() =>
            {
                report.error(format!(
                    "'product' and 'channel' must not be empty in {}",
                    context
                ));
            }
            _ => {}
        }
        validate_os_and_registries(&mut self.os, &mut self.registries, context, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{NoVersionSources, StreamRelease};
    use serial_test::serial;

    struct FixedStream;

    impl ReleaseStreams for FixedStream {
        fn release(&self, product: &str, channel: &str) -> Result<StreamRelease> {
            assert_eq!((product, channel), ("workbench", "daily"));
            Ok(StreamRelease {
                version: "2025.09.0-daily+123".to_string(),
                downloads: BTreeMap::from([(
                    "ubuntu2204".to_string(),
                    "https://example.invalid/wb-jammy.deb".to_string(),
                )]),
            })
        }
    }

    fn parse(yaml: &str) -> DevVersion {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn test_yaml_shapes() {
        let env = parse("sourceType: env\nversionEnv: WB_VERSION\nurlEnv: WB_URL\n");
        assert_eq!(
            env.source,
            DevVersionSource::Env {
                version_env: "WB_VERSION".to_string(),
                url_env: Some("WB_URL".to_string()),
            }
        );

        let stream = parse(
            "sourceType: stream\nproduct: workbench\nchannel: daily\nos:\n  - name: Ubuntu 22.04\n",
        );
        assert!(matches!(stream.source, DevVersionSource::Stream { .. }));
        assert_eq!(stream.os.len(), 1);
    }

    #[test]
    fn test_stream_materialize() {
        let dev = parse(
            "sourceType: stream\nproduct: workbench\nchannel: daily\nos:\n  - name: Ubuntu 22.04\n  - name: Ubuntu 24.04\n",
        );
        let version = dev.materialize(&FixedStream).unwrap();
        assert_eq!(version.name, "2025.09.0-daily+123");
        assert_eq!(version.subpath, ".dev-2025.09.0-daily+123");
        assert!(version.ephemeral);
        assert!(version.is_development_version);
        assert!(!version.latest);
        assert_eq!(
            version.os[0].artifact_download_url.as_deref(),
            Some("https://example.invalid/wb-jammy.deb")
        );
        assert!(version.os[1].artifact_download_url.is_none());
    }

    #[test]
    #[serial]
    fn test_env_materialize() {
        std::env::set_var("BAKERY_TEST_DEV_VERSION", "2025.10.0-dev+7");
        std::env::set_var("BAKERY_TEST_DEV_URL", "https://example.invalid/dev.deb");
        let dev = parse(
            "sourceType: env\nversionEnv: BAKERY_TEST_DEV_VERSION\nurlEnv: BAKERY_TEST_DEV_URL\nos:\n  - name: Ubuntu 22.04\n",
        );
        let version = dev.materialize(&NoVersionSources).unwrap();
        assert_eq!(version.name, "2025.10.0-dev+7");
        assert_eq!(
            version.os[0].artifact_download_url.as_deref(),
            Some("https://example.invalid/dev.deb")
        );
        std::env::remove_var("BAKERY_TEST_DEV_VERSION");
        std::env::remove_var("BAKERY_TEST_DEV_URL");
    }

    #[test]
    #[serial]
    fn test_env_missing_is_error() {
        std::env::remove_var("BAKERY_TEST_DEV_MISSING");
        let dev = parse("sourceType: env\nversionEnv: BAKERY_TEST_DEV_MISSING\n");
        let err = dev.materialize(&NoVersionSources).unwrap_err();
        assert!(err.to_string().contains("BAKERY_TEST_DEV_MISSING"));
    }

    #[test]
    fn test_validate_uses_generic_label() {
        let mut dev = parse("sourceType: stream\nproduct: ''\nchannel: daily\n");
        let mut report = ValidationReport::new();
        dev.validate("image 'demo' devVersion", &mut report);
        assert!(report.errors()[0].contains("devVersion"));
    }
}
