//! Build context fixtures
//!
//! A [`ContextFixture`] is a temporary directory acting as a build context
//! with a bakery.yaml and whatever Containerfiles a test needs.

#![allow(dead_code)]

use bakery_core::BakeryConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// One image, one latest version, one OS, Standard and Minimal variants
pub const DEMO_CONFIG: &str = r#"
repository:
  url: https://github.com/acme/images
  vendor: Acme
  maintainer: Images Team
  revision: 0123abc
registries:
  - host: ghcr.io
    namespace: acme
images:
  - name: demo
    displayName: Demo
    variants:
      - name: Standard
        primary: true
      - name: Minimal
    versions:
      - name: "1.0.0"
        latest: true
        os:
          - name: Ubuntu 22.04
"#;

/// An image whose versions get R pinned by a constraint
pub const R_CONSTRAINT_CONFIG: &str = r#"
images:
  - name: r-session
    dependencyConstraints:
      - dependency: R
        constraint:
          latest: true
          count: 2
    versions:
      - name: "2025.05.0"
        latest: true
        os:
          - name: Ubuntu 24.04
"#;

/// Temporary build context
pub struct ContextFixture {
    temp_dir: TempDir,
    context: Utf8PathBuf,
}

impl ContextFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let context = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
            .expect("temp dir is valid UTF-8");
        Self { temp_dir, context }
    }

    pub fn context(&self) -> &Utf8Path {
        &self.context
    }

    /// Write a file relative to the context, creating parent directories
    pub fn write(&self, rel: &str, content: &str) -> Utf8PathBuf {
        let path = self.context.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    /// Write bakery.yaml and load it
    pub fn load(&self, yaml: &str) -> BakeryConfig {
        let path = self.write("bakery.yaml", yaml);
        BakeryConfig::load(Some(&path)).expect("Failed to load fixture config")
    }

    pub fn temp_dir(&self) -> &TempDir {
        &self.temp_dir
    }
}

impl Default for ContextFixture {
    fn default() -> Self {
        Self::new()
    }
}
