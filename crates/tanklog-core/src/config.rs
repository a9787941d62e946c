//! API endpoint configuration for client apps.
//!
//! Resolves the backend base URL from an explicit value, the
//! `TANKLOG_API_BASE_URL` environment variable, or the built-in development
//! default, and derives the per-resource-group base URLs from it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Development backend used when nothing else is configured.
pub const DEV_API_BASE_URL: &str = "http://localhost:8082";

const API_BASE_URL_ENV: &str = "TANKLOG_API_BASE_URL";

/// Resolved backend endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    /// Builds a config for an explicit base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
        })
    }

    /// Resolve from an optional explicit URL, then the environment, then the
    /// development default.
    pub fn resolve(explicit: Option<String>) -> Result<Self> {
        if let Some(url) = normalize_text_option(explicit) {
            return Self::new(url);
        }
        if let Some(url) = normalize_text_option(std::env::var(API_BASE_URL_ENV).ok()) {
            return Self::new(url);
        }
        Self::new(DEV_API_BASE_URL)
    }

    /// Returns the base URL this config was built from.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL for the auth endpoint group.
    pub fn auth_url(&self) -> String {
        format!("{}/api/auth", self.base_url)
    }

    /// Base URL for the fuel-record endpoint group.
    pub fn records_url(&self) -> String {
        format!("{}/api/fuel-records", self.base_url)
    }
}

/// Validate and normalize a backend base URL.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let base = raw.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(Error::InvalidConfiguration("API base URL must not be empty"));
    }
    if !is_http_url(base) {
        return Err(Error::InvalidConfiguration(
            "API base URL must include http:// or https://",
        ));
    }
    Ok(base.to_string())
}
