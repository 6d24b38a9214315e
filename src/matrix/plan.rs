//! Output model: what to build and how.

use serde::{Deserialize, Serialize};

/// Label schema handed to the image builder
pub const LABEL_TYPE: &str = "org.opencontainers.image";

/// Floating tag applied to every built image
pub const LATEST_TAG: &str = "latest";

/// One image (app channel) scheduled for a rebuild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_version: Option<String>,
    pub tags: Vec<String>,
    pub label_type: String,
}

impl Image {
    pub fn new(name: String, version: String, published_version: Option<String>) -> Self {
        let tags = vec![LATEST_TAG.to_string(), version.clone()];
        Self {
            name,
            version,
            published_version,
            tags,
            label_type: LABEL_TYPE.to_string(),
        }
    }
}

/// Build instructions for one platform of an [`Image`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformBuild {
    pub name: String,
    pub version: String,
    pub platform: String,
    pub target_os: String,
    pub target_arch: String,
    pub channel: String,
    #[serde(rename = "dockerfile")]
    pub dockerfile_path: String,
    #[serde(rename = "context")]
    pub docker_context: String,
    pub label_type: String,
}

/// Images and their per-platform builds, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub image_platforms: Vec<PlatformBuild>,
    pub images: Vec<Image>,
}

impl BuildPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.image_platforms.is_empty()
    }

    /// Add an image together with its platform builds
    pub fn push(&mut self, image: Image, platforms: Vec<PlatformBuild>) {
        self.image_platforms.extend(platforms);
        self.images.push(image);
    }

    /// Append another plan after this one
    pub fn extend(&mut self, other: BuildPlan) {
        self.image_platforms.extend(other.image_platforms);
        self.images.extend(other.images);
    }
}
