//! In-memory HTTP fetcher

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bakery_versions::HttpFetch;
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers from a URL table and records every request
#[derive(Default)]
pub struct FakeHttp {
    bodies: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(url.into(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HttpFetch for FakeHttp {
    async fn get_text(&self, url: &str) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found: {}", url))
    }
}
