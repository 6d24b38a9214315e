use super::VersionSource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Canned versions keyed by app directory and channel
#[derive(Debug, Default, Clone)]
pub struct StaticVersions {
    versions: HashMap<(PathBuf, String), String>,
}

impl StaticVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, app_dir: impl AsRef<Path>, channel: &str, version: &str) -> Self {
        self.versions.insert(
            (app_dir.as_ref().to_path_buf(), channel.to_string()),
            version.to_string(),
        );
        self
    }
}

#[async_trait]
impl VersionSource for StaticVersions {
    async fn latest_version(&self, app_dir: &Path, channel: &str) -> Option<String> {
        self.versions
            .get(&(app_dir.to_path_buf(), channel.to_string()))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
