//! Published-version lookup.
//!
//! The matrix engine only sees [`PublishedVersionLookup`]: given an image
//! name, return the tag currently published for it. How that tag is chosen
//! (GHCR package versions, longest non-`latest` tag) stays behind the trait
//! so a semver-aware comparator can replace it without touching the engine.

mod github;
mod mock;

pub use github::{
    select_published_tag, ContainerMetadata, GithubPackages, PackageMetadata, PackageVersion,
    DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use mock::StaticLookup;

use async_trait::async_trait;
use thiserror::Error;

/// Why a published version could not be determined
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Nothing published yet; not a failure
    #[error("no published version for image '{image}'")]
    NotFound { image: String },

    /// Network, auth or HTTP-level failure
    #[error("lookup for image '{image}' failed: {message}")]
    Transport {
        image: String,
        status: Option<u16>,
        message: String,
    },

    /// The response body could not be understood
    #[error("malformed lookup response for image '{image}': {message}")]
    Decode { image: String, message: String },
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound { .. })
    }
}

#[async_trait]
pub trait PublishedVersionLookup: Send + Sync {
    async fn published_version(&self, image: &str) -> Result<String, LookupError>;
}

/// Outcome of a lookup as the build decision sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishedState {
    /// A non-empty published tag
    Published(String),
    /// Never published, or published without a usable tag
    Unpublished,
    /// Lookup failed; the build decision proceeds as if unpublished
    Unavailable(LookupError),
}

impl PublishedState {
    pub fn from_lookup(result: Result<String, LookupError>) -> Self {
        match result {
            Ok(version) if version.is_empty() => PublishedState::Unpublished,
            Ok(version) => PublishedState::Published(version),
            Err(e) if e.is_not_found() => PublishedState::Unpublished,
            Err(e) => PublishedState::Unavailable(e),
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            PublishedState::Published(v) => Some(v),
            _ => None,
        }
    }

    /// True when the published tag already carries `version`
    pub fn is_current(&self, version: &str) -> bool {
        self.version().is_some_and(|published| published.contains(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> LookupError {
        LookupError::Transport {
            image: "foo".to_string(),
            status: Some(401),
            message: "401 Unauthorized".to_string(),
        }
    }

    #[test]
    fn test_state_from_lookup() {
        assert_eq!(
            PublishedState::from_lookup(Ok("1.2.3".to_string())),
            PublishedState::Published("1.2.3".to_string())
        );
        assert_eq!(
            PublishedState::from_lookup(Ok(String::new())),
            PublishedState::Unpublished
        );
        assert_eq!(
            PublishedState::from_lookup(Err(LookupError::NotFound {
                image: "foo".to_string()
            })),
            PublishedState::Unpublished
        );
        assert_eq!(
            PublishedState::from_lookup(Err(transport())),
            PublishedState::Unavailable(transport())
        );
    }

    #[test]
    fn test_is_current_uses_substring_match() {
        let state = PublishedState::Published("1.2.3-extra".to_string());
        assert!(state.is_current("1.2.3"));
        assert!(state.is_current("2.3"));
        assert!(!state.is_current("1.2.4"));
    }

    #[test]
    fn test_failed_or_missing_lookup_is_never_current() {
        assert!(!PublishedState::Unpublished.is_current("1.2.3"));
        assert!(!PublishedState::Unavailable(transport()).is_current("1.2.3"));
        assert_eq!(PublishedState::Unavailable(transport()).version(), None);
    }
}
