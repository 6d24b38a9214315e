use super::VersionSource;
use crate::fs::FileSystem;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 120;

const PROBE_NAME: &str = "latest.sh";

/// Runs `latest.sh <channel>` and reads the version from stdout
pub struct ScriptProbe {
    fs: Arc<dyn FileSystem>,
    timeout: Duration,
}

impl ScriptProbe {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self::with_timeout(fs, Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS))
    }

    pub fn with_timeout(fs: Arc<dyn FileSystem>, timeout: Duration) -> Self {
        Self { fs, timeout }
    }

    /// Probe to run for `channel`, shared probe first
    pub fn locate(&self, app_dir: &Path, channel: &str) -> Option<PathBuf> {
        [
            app_dir.join("ci").join(PROBE_NAME),
            app_dir.join(channel).join(PROBE_NAME),
        ]
        .into_iter()
        .find(|candidate| self.fs.is_file(candidate))
    }

    async fn run(&self, script: &Path, channel: &str) -> Option<String> {
        let mut cmd = Command::new(script);
        cmd.arg(channel)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(probe = %script.display(), channel, "Failed to execute version probe: {}", e);
                return None;
            }
            Err(_) => {
                warn!(
                    probe = %script.display(),
                    channel,
                    "Version probe timed out after {}s",
                    self.timeout.as_secs()
                );
                return None;
            }
        };

        if !output.status.success() {
            debug!(
                probe = %script.display(),
                channel,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Version probe exited unsuccessfully"
            );
            return None;
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if version.is_empty() {
            debug!(probe = %script.display(), channel, "Version probe printed nothing");
            return None;
        }

        Some(version)
    }
}

#[async_trait]
impl VersionSource for ScriptProbe {
    async fn latest_version(&self, app_dir: &Path, channel: &str) -> Option<String> {
        let Some(script) = self.locate(app_dir, channel) else {
            debug!(app_dir = %app_dir.display(), channel, "No version probe found");
            return None;
        };

        self.run(&script, channel).await
    }
}
