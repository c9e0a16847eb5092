//! Runtime settings from `BAKERY_*` environment variables

use crate::error::{Error, Result};
use std::env;

/// Default lifetime of cached HTTP responses
pub const DEFAULT_HTTP_CACHE_TTL_SECS: u64 = 3600;

/// Default timeout for HTTP requests to version sources
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Settings that are not part of bakery.yaml
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Base URL of the product release stream service
    pub release_stream_url: Option<String>,
    pub http_cache_ttl_secs: u64,
    pub http_timeout_secs: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            release_stream_url: None,
            http_cache_ttl_secs: DEFAULT_HTTP_CACHE_TTL_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl RuntimeSettings {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Ok(val) = env::var("BAKERY_RELEASE_STREAM_URL") {
            let val = val.trim().trim_end_matches('/').to_string();
            if !val.is_empty() {
                settings.release_stream_url = Some(val);
            }
        }

        if let Ok(val) = env::var("BAKERY_HTTP_CACHE_TTL_SECS") {
            settings.http_cache_ttl_secs = val.parse().map_err(|_| {
                Error::invalid_config("BAKERY_HTTP_CACHE_TTL_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("BAKERY_HTTP_TIMEOUT_SECS") {
            settings.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("BAKERY_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        env::remove_var("BAKERY_RELEASE_STREAM_URL");
        env::remove_var("BAKERY_HTTP_CACHE_TTL_SECS");
        env::remove_var("BAKERY_HTTP_TIMEOUT_SECS");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        assert_eq!(RuntimeSettings::from_env().unwrap(), RuntimeSettings::default());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear();
        env::set_var("BAKERY_RELEASE_STREAM_URL", "https://streams.example.invalid/");
        env::set_var("BAKERY_HTTP_CACHE_TTL_SECS", "60");
        let settings = RuntimeSettings::from_env().unwrap();
        assert_eq!(
            settings.release_stream_url.as_deref(),
            Some("https://streams.example.invalid")
        );
        assert_eq!(settings.http_cache_ttl_secs, 60);
        assert_eq!(settings.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        clear();
    }

    #[test]
    #[serial]
    fn test_bad_number_is_error() {
        clear();
        env::set_var("BAKERY_HTTP_TIMEOUT_SECS", "soon");
        let err = RuntimeSettings::from_env().unwrap_err();
        assert!(err.to_string().contains("BAKERY_HTTP_TIMEOUT_SECS"));
        clear();
    }
}
