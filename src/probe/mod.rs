//! Latest upstream version per channel.
//!
//! A channel's version comes from an executable `latest.sh`. The shared
//! `ci/latest.sh` wins over a per-channel `<channel>/latest.sh`. Any failure
//! (missing probe, non-zero exit, timeout, empty output) means "no version",
//! and the channel is skipped without being treated as an error.

mod mock;
mod script;

pub use mock::StaticVersions;
pub use script::{ScriptProbe, DEFAULT_PROBE_TIMEOUT_SECS};

use async_trait::async_trait;
use std::path::Path;

/// Source of the latest upstream version for an app channel
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Trimmed, non-empty version string, or `None` when unavailable
    async fn latest_version(&self, app_dir: &Path, channel: &str) -> Option<String>;
}
