//! GitHub Container Registry lookup via the Packages REST API.
//!
//! `GET {api}/users/{owner}/packages/container/{image}/versions` returns the
//! package versions newest first. The first version tagged `latest` is taken
//! as the live one, and its longest remaining tag is reported (e.g.
//! `4.7.5.7809-ls123` beats `4.7`). Length is a stand-in for specificity;
//! it is not a semver comparison.

use super::{LookupError, PublishedVersionLookup};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const LATEST_TAG: &str = "latest";
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// One entry of the package versions listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageVersion {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub metadata: PackageMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(default)]
    pub package_type: String,
    #[serde(default)]
    pub container: ContainerMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Longest non-`latest` tag of the first version tagged `latest`.
///
/// `None` when no version carries `latest`. A version tagged only `latest`
/// yields `Some("")`.
pub fn select_published_tag(versions: &[PackageVersion]) -> Option<String> {
    let tags = &versions
        .iter()
        .find(|v| v.metadata.container.tags.iter().any(|t| t == LATEST_TAG))?
        .metadata
        .container
        .tags;

    let longest = tags
        .iter()
        .filter(|t| t.as_str() != LATEST_TAG)
        .fold("", |longest, tag| {
            if tag.len() > longest.len() {
                tag.as_str()
            } else {
                longest
            }
        });

    Some(longest.to_string())
}

pub struct GithubPackages {
    api_base: String,
    owner: Option<String>,
    token: Option<String>,
    http_client: Client,
    timeout: Duration,
}

impl GithubPackages {
    pub fn new(owner: Option<String>, token: Option<String>) -> reqwest::Result<Self> {
        Self::with_options(
            DEFAULT_API_BASE.to_string(),
            owner,
            token,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_options(
        api_base: String,
        owner: Option<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            owner,
            token,
            http_client,
            timeout,
        })
    }

    fn versions_url(&self, owner: &str, image: &str) -> String {
        format!(
            "{}/users/{}/packages/container/{}/versions",
            self.api_base, owner, image
        )
    }

    fn transport_error(&self, image: &str, e: reqwest::Error) -> LookupError {
        let message = if e.is_timeout() {
            format!("request timed out after {:?}", self.timeout)
        } else if e.is_connect() {
            format!("cannot connect to {}: {}", self.api_base, e)
        } else {
            e.to_string()
        };

        LookupError::Transport {
            image: image.to_string(),
            status: e.status().map(|s| s.as_u16()),
            message,
        }
    }
}

#[async_trait]
impl PublishedVersionLookup for GithubPackages {
    async fn published_version(&self, image: &str) -> Result<String, LookupError> {
        let Some(owner) = self.owner.as_deref() else {
            return Err(LookupError::Transport {
                image: image.to_string(),
                status: None,
                message: "repository owner not configured".to_string(),
            });
        };

        let url = self.versions_url(owner, image);
        debug!(image, url = %url, "Looking up published version");

        let mut request = self
            .http_client
            .get(&url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, concat!("buildmatrix/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(image, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound {
                image: image.to_string(),
            });
        }
        if !status.is_success() {
            return Err(LookupError::Transport {
                image: image.to_string(),
                status: Some(status.as_u16()),
                message: format!("unexpected HTTP status {}", status),
            });
        }

        let versions: Vec<PackageVersion> = response.json().await.map_err(|e| {
            if e.is_decode() {
                LookupError::Decode {
                    image: image.to_string(),
                    message: e.to_string(),
                }
            } else {
                self.transport_error(image, e)
            }
        })?;

        select_published_tag(&versions).ok_or_else(|| LookupError::NotFound {
            image: image.to_string(),
        })
    }
}
