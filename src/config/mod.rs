//
//  scm-bitbucket
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration Module
//!
//! Adapter configuration, loaded from TOML and validated once when the
//! adapter is constructed. Every option except the OAuth credentials has a
//! default, so a minimal file only names the OAuth consumer.
//!
//! ## Example Configuration File
//!
//! ```toml
//! oauth_client_id = "client-id"
//! oauth_client_secret = "client-secret"
//! username = "sd-buildbot"
//! email = "dev-null@screwdriver.cd"
//! https = true
//!
//! [read_only]
//! enabled = true
//! username = "reader"
//! access_token = "token"
//! clone_type = "ssh"
//!
//! [fusebox.retry]
//! retries = 3
//! min_timeout_ms = 500
//!
//! [fusebox.breaker]
//! failure_threshold = 5
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use scm_bitbucket::config::AdapterConfig;
//!
//! let config: AdapterConfig = toml::from_str(
//!     "oauth_client_id = \"id\"\noauth_client_secret = \"secret\"",
//! ).unwrap();
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.hostname, "bitbucket.org");
//! assert_eq!(config.scm_context(), "bitbucket:bitbucket.org");
//! ```
//!
//! ## Submodules
//!
//! - [`hosts`]: Bitbucket endpoint constants and host comparison helpers

mod hosts;

pub use hosts::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::common::ScmError;

/// Complete adapter configuration.
///
/// # Default Values
///
/// | Field | Default |
/// |-------|---------|
/// | `username` | `"sd-buildbot"` |
/// | `email` | `"dev-null@screwdriver.cd"` |
/// | `https` | `false` |
/// | `hostname` | `"bitbucket.org"` |
/// | `api_url` | `"https://api.bitbucket.org/2.0"` |
/// | `oauth_token_url` | `"https://bitbucket.org/site/oauth2/access_token"` |
///
/// `oauth_client_id` and `oauth_client_secret` have no usable default;
/// [`validate`](Self::validate) rejects them when empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Git user name written into the checkout script.
    #[serde(default = "default_username")]
    pub username: String,

    /// Git user email written into the checkout script.
    #[serde(default = "default_email")]
    pub email: String,

    /// Alternate read-only credential path for checkouts.
    #[serde(default)]
    pub read_only: ReadOnlyConfig,

    /// Whether the OAuth callback runs over TLS.
    #[serde(default)]
    pub https: bool,

    /// OAuth consumer key.
    #[serde(default)]
    pub oauth_client_id: String,

    /// OAuth consumer secret.
    #[serde(default)]
    pub oauth_client_secret: String,

    /// Hostname checkout URLs and webhook payloads must belong to.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Base URL of the REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// OAuth token endpoint.
    #[serde(default = "default_token_url")]
    pub oauth_token_url: String,

    /// Transport resilience tuning.
    #[serde(default)]
    pub fusebox: FuseboxConfig,
}

/// Read-only checkout settings.
///
/// For https clones the checkout script prefers the `SCM_USERNAME` and
/// `SCM_ACCESS_TOKEN` build variables. `username` and `access_token` are
/// the fallback when those are not exported, and are written into the
/// script in that case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadOnlyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub clone_type: CloneType,
}

/// Protocol used to clone in read-only mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneType {
    #[default]
    Https,
    Ssh,
}

/// Retry and circuit-breaker settings for the HTTP transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FuseboxConfig {
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub breaker: BreakerConfig,
}

/// Exponential backoff policy. Only server and network failures are retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of retries after the first attempt.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Multiplier applied to the delay after each retry.
    #[serde(default = "default_factor")]
    pub factor: u32,

    /// Delay before the first retry.
    #[serde(default = "default_min_timeout_ms")]
    pub min_timeout_ms: u64,

    /// Upper bound for any single delay.
    #[serde(default = "default_max_timeout_ms")]
    pub max_timeout_ms: u64,
}

/// Consecutive-failure circuit breaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failed requests that open the breaker.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// How long the breaker stays open before letting a trial request through.
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,
}

fn default_username() -> String {
    "sd-buildbot".to_string()
}

fn default_email() -> String {
    "dev-null@screwdriver.cd".to_string()
}

fn default_hostname() -> String {
    BITBUCKET_CLOUD.to_string()
}

fn default_api_url() -> String {
    BITBUCKET_API_URL.to_string()
}

fn default_token_url() -> String {
    BITBUCKET_TOKEN_URL.to_string()
}

fn default_retries() -> u32 {
    5
}

fn default_factor() -> u32 {
    2
}

fn default_min_timeout_ms() -> u64 {
    1000
}

fn default_max_timeout_ms() -> u64 {
    10_000
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_ms() -> u64 {
    10_000
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            email: default_email(),
            read_only: ReadOnlyConfig::default(),
            https: false,
            oauth_client_id: String::new(),
            oauth_client_secret: String::new(),
            hostname: default_hostname(),
            api_url: default_api_url(),
            oauth_token_url: default_token_url(),
            fusebox: FuseboxConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            factor: default_factor(),
            min_timeout_ms: default_min_timeout_ms(),
            max_timeout_ms: default_max_timeout_ms(),
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
        }
    }
}

impl AdapterConfig {
    /// Creates a configuration with the given OAuth consumer and defaults
    /// for everything else.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            oauth_client_id: client_id.into(),
            oauth_client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration file.
    ///
    /// The file is parsed but not validated; validation happens when the
    /// adapter is built.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Loads the configuration from `path`, or from the default location
    /// when no path is given. A missing default file yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Default location of the configuration file.
    ///
    /// - **Linux**: `~/.config/scm-bitbucket/config.toml`
    /// - **macOS**: `~/Library/Application Support/scm-bitbucket/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "scm-bitbucket")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// The orchestrator-facing context name, `bitbucket:<hostname>`.
    pub fn scm_context(&self) -> String {
        format!("bitbucket:{}", self.hostname)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError::Validation`] naming the first offending option.
    pub fn validate(&self) -> std::result::Result<(), ScmError> {
        fn invalid(message: &str) -> std::result::Result<(), ScmError> {
            Err(ScmError::Validation(message.to_string()))
        }

        if self.oauth_client_id.trim().is_empty() {
            return invalid("\"oauth_client_id\" is required");
        }
        if self.oauth_client_secret.trim().is_empty() {
            return invalid("\"oauth_client_secret\" is required");
        }
        if self.username.trim().is_empty() {
            return invalid("\"username\" must not be empty");
        }
        if self.email.trim().is_empty() {
            return invalid("\"email\" must not be empty");
        }
        if self.hostname.is_empty() || self.hostname.contains(':') || self.hostname.contains('/') {
            return invalid("\"hostname\" must be a bare host name");
        }
        if Url::parse(&self.api_url).is_err() {
            return invalid("\"api_url\" must be an absolute URL");
        }
        if Url::parse(&self.oauth_token_url).is_err() {
            return invalid("\"oauth_token_url\" must be an absolute URL");
        }
        if self.read_only.username.is_empty() != self.read_only.access_token.is_empty() {
            return invalid("\"read_only.username\" and \"read_only.access_token\" must be set together");
        }

        let retry = &self.fusebox.retry;
        if retry.factor == 0 {
            return invalid("\"fusebox.retry.factor\" must be at least 1");
        }
        if retry.min_timeout_ms > retry.max_timeout_ms {
            return invalid("\"fusebox.retry.min_timeout_ms\" must not exceed \"max_timeout_ms\"");
        }
        if self.fusebox.breaker.failure_threshold == 0 {
            return invalid("\"fusebox.breaker.failure_threshold\" must be at least 1");
        }

        Ok(())
    }
}
