//! Configuration management for buildmatrix
//!
//! Settings come from environment variables with sensible defaults and are
//! passed explicitly to the components that need them; nothing here is
//! global state.
//!
//! # Environment Variables
//!
//! ## Registry credentials
//! - `GITHUB_REPOSITORY_OWNER` (fallback `REPO_OWNER`): package owner
//! - `GITHUB_TOKEN` (fallback `TOKEN`): API token
//!
//! Missing credentials are not fatal. Every published-version lookup then
//! fails and the affected images are scheduled for a build.
//!
//! ## Buildmatrix settings
//! - `BUILDMATRIX_APPS_ROOT`: apps directory - default: "apps"
//! - `BUILDMATRIX_GITHUB_API`: API base URL - default: "https://api.github.com"
//! - `BUILDMATRIX_PROBE_TIMEOUT`: version probe timeout in seconds - default: "120"
//! - `BUILDMATRIX_REQUEST_TIMEOUT`: lookup request timeout in seconds - default: "30"
//! - `BUILDMATRIX_CONCURRENCY`: apps processed at once - default: "4"
//!
//! Logging is configured separately by `util::logging`, which reads
//! `BUILDMATRIX_LOG_LEVEL` and `BUILDMATRIX_LOG_JSON` with the same empty-is-unset rule.
//!
//! Empty values are treated as unset.

use crate::probe::DEFAULT_PROBE_TIMEOUT_SECS;
use crate::registry::{GithubPackages, DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECS};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_APPS_ROOT: &str = "apps";
const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// The registry HTTP client could not be built
    #[error("Failed to initialize registry client: {0}")]
    RegistryClient(#[from] reqwest::Error),
}

/// Owner and token for the package registry
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub owner: Option<String>,
    pub token: Option<String>,
}

impl RegistryCredentials {
    pub fn from_env() -> Self {
        Self {
            owner: env_with_fallback("GITHUB_REPOSITORY_OWNER", "REPO_OWNER"),
            token: env_with_fallback("GITHUB_TOKEN", "TOKEN"),
        }
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("owner", &self.owner)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MatrixConfig {
    pub credentials: RegistryCredentials,

    /// Directory holding one subdirectory per app
    pub apps_root: PathBuf,

    /// GitHub REST API base URL
    pub api_base: String,

    pub probe_timeout_secs: u64,

    pub request_timeout_secs: u64,

    /// Apps processed concurrently
    pub concurrency: usize,
}

impl Default for MatrixConfig {
    /// Loads from environment variables, falling back to defaults
    fn default() -> Self {
        let apps_root = env_var("BUILDMATRIX_APPS_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_APPS_ROOT));

        let api_base =
            env_var("BUILDMATRIX_GITHUB_API").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let probe_timeout_secs = env_var("BUILDMATRIX_PROBE_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS);

        let request_timeout_secs = env_var("BUILDMATRIX_REQUEST_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let concurrency = env_var("BUILDMATRIX_CONCURRENCY")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_CONCURRENCY);

        Self {
            credentials: RegistryCredentials::from_env(),
            apps_root,
            api_base,
            probe_timeout_secs,
            request_timeout_secs,
            concurrency,
        }
    }
}

impl MatrixConfig {
    /// Validates the configuration
    ///
    /// Timeouts and concurrency must be positive. Missing credentials are
    /// allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "probe timeout must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "request timeout must be greater than 0".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Registry lookup client carrying this configuration's credentials
    pub fn create_lookup(&self) -> Result<GithubPackages, ConfigError> {
        Ok(GithubPackages::with_options(
            self.api_base.clone(),
            self.credentials.owner.clone(),
            self.credentials.token.clone(),
            self.request_timeout(),
        )?)
    }
}

/// Environment variable value, with empty strings treated as unset
pub(crate) fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env_var(primary).or_else(|| env_var(fallback))
}
