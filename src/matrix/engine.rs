//! Per-app build decisions.
//!
//! A channel is rebuilt unless it has no upstream version, or (without
//! `force`) the published tag already contains the upstream version.
//! Substring containment is deliberate: published tags often carry build
//! suffixes such as `1.2.3-ls42`. Lookup failures other than "not found" do
//! not block a build; they are logged so credential or network problems
//! stay visible.

use crate::fs::FileSystem;
use crate::metadata::{AppMetadata, Channel, MetadataError, Platform};
use crate::probe::VersionSource;
use crate::registry::{PublishedState, PublishedVersionLookup};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::channels::select_channels;
use super::plan::{BuildPlan, Image, PlatformBuild, LABEL_TYPE};

const DOCKERFILE: &str = "Dockerfile";

/// Why a channel produced no image
#[derive(Debug)]
pub enum SkipReason {
    /// The version probe was missing, failed, or printed nothing
    NoVersion,
    /// The published tag already contains the upstream version
    UpToDate { published: String },
    /// A platform entry is not `OS/ARCH`
    InvalidPlatform(MetadataError),
}

#[derive(Debug)]
pub enum ChannelDecision {
    Build {
        image: Image,
        platforms: Vec<PlatformBuild>,
    },
    Skip(SkipReason),
}

pub struct MatrixEngine {
    fs: Arc<dyn FileSystem>,
    versions: Arc<dyn VersionSource>,
    lookup: Arc<dyn PublishedVersionLookup>,
}

impl MatrixEngine {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        versions: Arc<dyn VersionSource>,
        lookup: Arc<dyn PublishedVersionLookup>,
    ) -> Self {
        Self {
            fs,
            versions,
            lookup,
        }
    }

    /// Plan every selected channel of one app, in descriptor order
    pub async fn assemble(
        &self,
        app_dir: &Path,
        metadata: &AppMetadata,
        requested_channels: &[String],
        force: bool,
    ) -> BuildPlan {
        let mut plan = BuildPlan::new();

        for channel in select_channels(&metadata.channels, requested_channels) {
            match self.decide(app_dir, &metadata.app, channel, force).await {
                ChannelDecision::Build { image, platforms } => {
                    info!(
                        app = %metadata.app,
                        channel = %channel.name,
                        image = %image.name,
                        version = %image.version,
                        published = image.published_version.as_deref().unwrap_or("-"),
                        "Scheduling build"
                    );
                    plan.push(image, platforms);
                }
                ChannelDecision::Skip(SkipReason::NoVersion) => {
                    debug!(app = %metadata.app, channel = %channel.name, "No upstream version, skipping channel");
                }
                ChannelDecision::Skip(SkipReason::UpToDate { published }) => {
                    info!(
                        app = %metadata.app,
                        channel = %channel.name,
                        published = %published,
                        "Already up to date"
                    );
                }
                ChannelDecision::Skip(SkipReason::InvalidPlatform(e)) => {
                    error!(app = %metadata.app, channel = %channel.name, "Skipping channel: {}", e);
                }
            }
        }

        plan
    }

    /// Decide whether one channel needs a build and, if so, how
    pub async fn decide(
        &self,
        app_dir: &Path,
        app: &str,
        channel: &Channel,
        force: bool,
    ) -> ChannelDecision {
        let Some(version) = self.versions.latest_version(app_dir, &channel.name).await else {
            return ChannelDecision::Skip(SkipReason::NoVersion);
        };

        let platforms = match channel.parsed_platforms() {
            Ok(platforms) => platforms,
            Err(e) => return ChannelDecision::Skip(SkipReason::InvalidPlatform(e)),
        };

        let name = channel.image_name(app);

        let published = if force {
            None
        } else {
            let state = self.published_state(&name).await;
            if state.is_current(&version) {
                return ChannelDecision::Skip(SkipReason::UpToDate {
                    published: state.version().unwrap_or_default().to_string(),
                });
            }
            state.version().map(str::to_string)
        };

        let (dockerfile, context) = self.build_context(app_dir, &channel.name);
        let platforms = channel
            .platforms
            .iter()
            .zip(platforms)
            .map(|(raw, Platform { os, arch })| PlatformBuild {
                name: name.clone(),
                version: version.clone(),
                platform: raw.clone(),
                target_os: os,
                target_arch: arch,
                channel: channel.name.clone(),
                dockerfile_path: dockerfile.display().to_string(),
                docker_context: context.display().to_string(),
                label_type: LABEL_TYPE.to_string(),
            })
            .collect();

        ChannelDecision::Build {
            image: Image::new(name, version, published),
            platforms,
        }
    }

    /// Dockerfile and build context for a channel.
    ///
    /// `<app>/<channel>/Dockerfile` wins over `<app>/Dockerfile`.
    pub fn build_context(&self, app_dir: &Path, channel: &str) -> (PathBuf, PathBuf) {
        let channel_dir = app_dir.join(channel);
        let channel_dockerfile = channel_dir.join(DOCKERFILE);

        if self.fs.is_file(&channel_dockerfile) {
            (channel_dockerfile, channel_dir)
        } else {
            (app_dir.join(DOCKERFILE), app_dir.to_path_buf())
        }
    }

    async fn published_state(&self, image: &str) -> PublishedState {
        let state = PublishedState::from_lookup(self.lookup.published_version(image).await);
        if let PublishedState::Unavailable(e) = &state {
            warn!(image, "Published version unavailable, building anyway: {}", e);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::probe::StaticVersions;
    use crate::registry::{LookupError, StaticLookup};

    const APP_DIR: &str = "apps/foo";

    fn channel(name: &str, platforms: &[&str], stable: bool) -> Channel {
        Channel {
            name: name.to_string(),
            platforms: platforms.iter().map(|p| p.to_string()).collect(),
            stable,
        }
    }

    fn metadata(channels: Vec<Channel>) -> AppMetadata {
        AppMetadata {
            app: "foo".to_string(),
            url: None,
            rules: Vec::new(),
            channels,
        }
    }

    fn app_fs() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("apps/foo/Dockerfile", "FROM scratch");
        fs
    }

    struct Harness {
        engine: MatrixEngine,
        lookup: Arc<StaticLookup>,
    }

    fn harness(fs: MockFileSystem, versions: StaticVersions, lookup: StaticLookup) -> Harness {
        let lookup = Arc::new(lookup);
        Harness {
            engine: MatrixEngine::new(Arc::new(fs), Arc::new(versions), lookup.clone()),
            lookup,
        }
    }

    #[tokio::test]
    async fn test_unpublished_stable_channel_is_built() {
        let h = harness(
            app_fs(),
            StaticVersions::new().with(APP_DIR, "stable", "1.2.3"),
            StaticLookup::new(),
        );
        let meta = metadata(vec![channel("stable", &["linux/amd64"], true)]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;

        assert_eq!(plan.images.len(), 1);
        let image = &plan.images[0];
        assert_eq!(image.name, "foo");
        assert_eq!(image.version, "1.2.3");
        assert_eq!(image.tags, vec!["latest", "1.2.3"]);
        assert_eq!(image.published_version, None);

        assert_eq!(plan.image_platforms.len(), 1);
        let build = &plan.image_platforms[0];
        assert_eq!(build.name, "foo");
        assert_eq!(build.channel, "stable");
        assert_eq!(build.platform, "linux/amd64");
        assert_eq!(build.target_os, "linux");
        assert_eq!(build.target_arch, "amd64");
        assert_eq!(build.version, "1.2.3");
        assert_eq!(build.dockerfile_path, "apps/foo/Dockerfile");
        assert_eq!(build.docker_context, "apps/foo");
        assert_eq!(build.label_type, LABEL_TYPE);

        assert_eq!(h.lookup.calls(), vec!["foo"]);
    }

    #[tokio::test]
    async fn test_published_tag_containing_version_skips_channel() {
        let h = harness(
            app_fs(),
            StaticVersions::new().with(APP_DIR, "stable", "1.2.3"),
            StaticLookup::new().published("foo", "1.2.3-extra"),
        );
        let meta = metadata(vec![channel("stable", &["linux/amd64"], true)]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_stale_published_version_is_reported() {
        let h = harness(
            app_fs(),
            StaticVersions::new().with(APP_DIR, "stable", "1.2.4"),
            StaticLookup::new().published("foo", "1.2.3-extra"),
        );
        let meta = metadata(vec![channel("stable", &["linux/amd64"], true)]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;
        assert_eq!(plan.images[0].published_version.as_deref(), Some("1.2.3-extra"));
    }

    #[tokio::test]
    async fn test_missing_version_skips_channel_without_lookup() {
        let h = harness(app_fs(), StaticVersions::new(), StaticLookup::new());
        let meta = metadata(vec![channel("stable", &["linux/amd64"], true)]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;
        assert!(plan.is_empty());
        assert!(h.lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_version_skips_channel() {
        let h = harness(
            app_fs(),
            StaticVersions::new().with(APP_DIR, "stable", ""),
            StaticLookup::new(),
        );
        let meta = metadata(vec![channel("stable", &["linux/amd64"], true)]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_force_bypasses_lookup() {
        let h = harness(
            app_fs(),
            StaticVersions::new().with(APP_DIR, "stable", "1.2.3"),
            StaticLookup::new().published("foo", "1.2.3"),
        );
        let meta = metadata(vec![channel("stable", &["linux/amd64"], true)]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], true).await;

        assert_eq!(plan.images.len(), 1);
        assert_eq!(plan.images[0].published_version, None);
        assert!(h.lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_defaults_to_build() {
        let h = harness(
            app_fs(),
            StaticVersions::new().with(APP_DIR, "stable", "1.2.3"),
            StaticLookup::new().failing(
                "foo",
                LookupError::Transport {
                    image: "foo".to_string(),
                    status: Some(401),
                    message: "unexpected HTTP status 401 Unauthorized".to_string(),
                },
            ),
        );
        let meta = metadata(vec![channel("stable", &["linux/amd64"], true)]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;
        assert_eq!(plan.images.len(), 1);
        assert_eq!(plan.images[0].published_version, None);
    }

    #[tokio::test]
    async fn test_decode_failure_defaults_to_build() {
        let h = harness(
            app_fs(),
            StaticVersions::new().with(APP_DIR, "stable", "1.2.3"),
            StaticLookup::new().failing(
                "foo",
                LookupError::Decode {
                    image: "foo".to_string(),
                    message: "expected a sequence".to_string(),
                },
            ),
        );
        let meta = metadata(vec![channel("stable", &["linux/amd64"], true)]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;
        assert_eq!(plan.images.len(), 1);
    }

    #[tokio::test]
    async fn test_unstable_channel_image_name_and_platform_expansion() {
        let h = harness(
            app_fs(),
            StaticVersions::new().with(APP_DIR, "beta", "2.0.0-rc1"),
            StaticLookup::new(),
        );
        let meta = metadata(vec![channel("beta", &["linux/amd64", "linux/arm64"], false)]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;

        assert_eq!(plan.images[0].name, "foo-beta");
        assert_eq!(h.lookup.calls(), vec!["foo-beta"]);
        let archs: Vec<&str> = plan
            .image_platforms
            .iter()
            .map(|p| p.target_arch.as_str())
            .collect();
        assert_eq!(archs, vec!["amd64", "arm64"]);
        assert!(plan.image_platforms.iter().all(|p| p.name == "foo-beta"));
    }

    #[tokio::test]
    async fn test_channel_dockerfile_wins_per_channel() {
        let fs = app_fs();
        fs.add_file("apps/foo/beta/Dockerfile", "FROM scratch");
        let h = harness(
            fs,
            StaticVersions::new()
                .with(APP_DIR, "stable", "1.0.0")
                .with(APP_DIR, "beta", "2.0.0"),
            StaticLookup::new(),
        );
        let meta = metadata(vec![
            channel("stable", &["linux/amd64"], true),
            channel("beta", &["linux/amd64"], false),
        ]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;

        assert_eq!(plan.image_platforms[0].dockerfile_path, "apps/foo/Dockerfile");
        assert_eq!(plan.image_platforms[0].docker_context, "apps/foo");
        assert_eq!(plan.image_platforms[1].dockerfile_path, "apps/foo/beta/Dockerfile");
        assert_eq!(plan.image_platforms[1].docker_context, "apps/foo/beta");
    }

    #[test]
    fn test_build_context_ignores_dockerfile_directory() {
        let fs = app_fs();
        fs.add_dir("apps/foo/beta/Dockerfile");
        let h = harness(fs, StaticVersions::new(), StaticLookup::new());

        let (dockerfile, context) = h.engine.build_context(Path::new(APP_DIR), "beta");
        assert_eq!(dockerfile, PathBuf::from("apps/foo/Dockerfile"));
        assert_eq!(context, PathBuf::from("apps/foo"));
    }

    #[tokio::test]
    async fn test_invalid_platform_skips_whole_channel() {
        let h = harness(
            app_fs(),
            StaticVersions::new()
                .with(APP_DIR, "stable", "1.0.0")
                .with(APP_DIR, "beta", "2.0.0"),
            StaticLookup::new(),
        );
        let meta = metadata(vec![
            channel("stable", &["linux/amd64", "linux"], true),
            channel("beta", &["linux/amd64"], false),
        ]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;

        assert_eq!(plan.images.len(), 1);
        assert_eq!(plan.images[0].name, "foo-beta");
        assert_eq!(plan.image_platforms.len(), 1);
        assert_eq!(h.lookup.calls(), vec!["foo-beta"]);
    }

    #[tokio::test]
    async fn test_requested_channels_restrict_processing() {
        let h = harness(
            app_fs(),
            StaticVersions::new()
                .with(APP_DIR, "stable", "1.0.0")
                .with(APP_DIR, "beta", "2.0.0"),
            StaticLookup::new(),
        );
        let meta = metadata(vec![
            channel("stable", &["linux/amd64"], true),
            channel("beta", &["linux/amd64"], false),
        ]);

        let plan = h
            .engine
            .assemble(Path::new(APP_DIR), &meta, &["beta".to_string()], false)
            .await;

        assert_eq!(plan.images.len(), 1);
        assert_eq!(plan.images[0].name, "foo-beta");
        assert_eq!(h.lookup.calls(), vec!["foo-beta"]);
    }

    #[tokio::test]
    async fn test_every_platform_build_has_matching_image() {
        let h = harness(
            app_fs(),
            StaticVersions::new()
                .with(APP_DIR, "stable", "1.0.0")
                .with(APP_DIR, "beta", "2.0.0")
                .with(APP_DIR, "nightly", "3.0.0"),
            StaticLookup::new().published("foo-nightly", "3.0.0"),
        );
        let meta = metadata(vec![
            channel("stable", &["linux/amd64", "linux/arm64"], true),
            channel("beta", &["linux/amd64"], false),
            channel("nightly", &["linux/amd64"], false),
        ]);

        let plan = h.engine.assemble(Path::new(APP_DIR), &meta, &[], false).await;

        assert_eq!(plan.images.len(), 2);
        for build in &plan.image_platforms {
            let owners = plan
                .images
                .iter()
                .filter(|i| i.name == build.name && i.version == build.version)
                .count();
            assert_eq!(owners, 1, "{} has no unique image", build.name);
        }
    }

    #[tokio::test]
    async fn test_decide_reports_up_to_date_tag() {
        let h = harness(
            app_fs(),
            StaticVersions::new().with(APP_DIR, "stable", "1.2.3"),
            StaticLookup::new().published("foo", "v1.2.3-ls9"),
        );
        let stable = channel("stable", &["linux/amd64"], true);

        match h.engine.decide(Path::new(APP_DIR), "foo", &stable, false).await {
            ChannelDecision::Skip(SkipReason::UpToDate { published }) => {
                assert_eq!(published, "v1.2.3-ls9")
            }
            other => panic!("expected up-to-date skip, got {:?}", other),
        }
    }
}
