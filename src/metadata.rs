//! Per-app descriptor (`apps/<app>/ci/metadata.yaml`)
//!
//! ```yaml
//! app: radarr
//! url: https://github.com/Radarr/Radarr
//! rules: ["master"]
//! channels:
//!   - name: stable
//!     platforms: ["linux/amd64", "linux/arm64"]
//!     stable: true
//!   - name: nightly
//!     platforms: ["linux/amd64"]
//!     stable: false
//! ```
//!
//! Descriptors are loaded once per run and never mutated. Channel names are
//! expected to be unique within an app; duplicates are not rejected here.

use crate::fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Descriptor location relative to an app directory
pub const METADATA_FILE: &str = "ci/metadata.yaml";

/// Problems with an app descriptor or its contents
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid platform '{platform}': {reason}")]
    InvalidPlatform { platform: String, reason: String },
}

/// One application and its release channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub app: String,

    /// Upstream project page, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Upstream release name filters, informational only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,

    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// A named release track with its own platform list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,

    /// `OS/ARCH` identifiers, kept verbatim for the output plan
    #[serde(default)]
    pub platforms: Vec<String>,

    /// Stable channels publish under the bare app name
    #[serde(default)]
    pub stable: bool,
}

impl AppMetadata {
    pub fn from_yaml_str(content: &str, path: &Path) -> Result<Self, MetadataError> {
        serde_yaml::from_str(content).map_err(|source| MetadataError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the descriptor of the app rooted at `app_dir`
    pub fn load(fs: &dyn FileSystem, app_dir: &Path) -> Result<Self, MetadataError> {
        let path = app_dir.join(METADATA_FILE);
        let content = fs
            .read_to_string(&path)
            .map_err(|e| MetadataError::Read {
                path: path.clone(),
                message: format!("{:#}", e),
            })?;

        Self::from_yaml_str(&content, &path)
    }
}

impl Channel {
    /// Image name this channel publishes to
    pub fn image_name(&self, app: &str) -> String {
        if self.stable {
            app.to_string()
        } else {
            format!("{}-{}", app, self.name)
        }
    }

    /// Parse every platform, failing on the first malformed one
    pub fn parsed_platforms(&self) -> Result<Vec<Platform>, MetadataError> {
        self.platforms.iter().map(|p| p.parse()).collect()
    }
}

/// An `OS/ARCH` pair such as `linux/amd64`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl FromStr for Platform {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| MetadataError::InvalidPlatform {
            platform: s.to_string(),
            reason: reason.to_string(),
        };

        let (os, arch) = s.split_once('/').ok_or_else(|| invalid("expected OS/ARCH"))?;
        if arch.contains('/') {
            return Err(invalid("expected exactly one '/' separator"));
        }
        if os.is_empty() || arch.is_empty() {
            return Err(invalid("OS and architecture must both be non-empty"));
        }

        Ok(Self {
            os: os.to_string(),
            arch: arch.to_string(),
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
