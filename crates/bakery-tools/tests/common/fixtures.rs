//! Build context fixtures with tool options

use bakery_core::BakeryConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// One image with goss and snyk options, overridden on the Minimal variant
pub const TOOLS_CONFIG: &str = r#"
registries:
  - host: ghcr.io
    namespace: acme
images:
  - name: demo
    options:
      - tool: goss
        wait: 5
        command: sleep 300
      - tool: snyk
        severityThreshold: high
    variants:
      - name: Standard
        primary: true
      - name: Minimal
        options:
          - tool: goss
            runtimeOptions: --privileged --init
    versions:
      - name: "1.0.0"
        latest: true
        os:
          - name: Ubuntu 22.04
"#;

/// Temporary build context holding a bakery.yaml
pub struct ToolFixture {
    temp_dir: TempDir,
    context: Utf8PathBuf,
}

impl ToolFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let context = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
            .expect("temp dir is valid UTF-8");
        Self { temp_dir, context }
    }

    pub fn context(&self) -> &Utf8Path {
        &self.context
    }

    pub fn write(&self, rel: &str, content: &str) -> Utf8PathBuf {
        let path = self.context.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    /// Write `yaml` with a shared Containerfile and load it
    pub fn load(&self, yaml: &str) -> BakeryConfig {
        self.write("demo/1.0.0/Containerfile.ubuntu2204", "FROM ubuntu:22.04\n");
        let path = self.write("bakery.yaml", yaml);
        BakeryConfig::load(Some(&path)).expect("Failed to load fixture config")
    }
}

impl Default for ToolFixture {
    fn default() -> Self {
        Self::new()
    }
}
