//! Common test infrastructure for bakery CLI tests
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Two variants of one latest version, no version lookups needed
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
    variants:
      - name: Standard
        primary: true
      - name: Minimal
    versions:
      - name: "1.0.0"
        latest: true
        os:
          - name: Ubuntu 22.04
  - name: other
    versions:
      - name: "2.0"
        os:
          - name: Ubuntu 24.04
"#;

/// Build context in a temporary directory
pub struct CliFixture {
    temp_dir: TempDir,
}

impl CliFixture {
    pub fn new(config: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("bakery.yaml"), config).expect("Failed to write config");
        for (dir, file) in [
            ("demo/1.0.0", "Containerfile.ubuntu2204"),
            ("other/2.0", "Containerfile"),
        ] {
            fs::create_dir_all(root.join(dir)).expect("Failed to create version dir");
            fs::write(root.join(dir).join(file), "FROM scratch\n")
                .expect("Failed to write Containerfile");
        }
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("bakery.yaml")
    }

    /// Run the bakery binary against this context's config
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_bakery"))
            .args(args)
            .arg("--config")
            .arg(self.config_path())
            .current_dir(self.path())
            .env_remove("BAKERY_RELEASE_STREAM_URL")
            .env_remove("BAKERY_HTTP_CACHE_TTL_SECS")
            .env_remove("BAKERY_HTTP_TIMEOUT_SECS")
            .output()
            .expect("Failed to run bakery")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
