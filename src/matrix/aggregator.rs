//! Cross-app orchestration

use crate::fs::FileSystem;
use crate::metadata::AppMetadata;
use futures_util::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use super::engine::MatrixEngine;
use super::plan::BuildPlan;

const ALL_APPS: &str = "all";
const DEFAULT_CONCURRENCY: usize = 4;

/// Errors that abort the whole run
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("failed to list apps under {root}: {message}")]
    Discovery { root: PathBuf, message: String },
}

/// Which apps a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppSelection {
    /// Every directory under the apps root
    All,
    Named(Vec<String>),
}

impl AppSelection {
    /// `all`, or a comma-separated list of app names
    pub fn parse(apps: &str) -> Self {
        if apps.trim() == ALL_APPS {
            AppSelection::All
        } else {
            AppSelection::Named(split_list(apps))
        }
    }
}

/// Split a comma-separated list, dropping blank items
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub apps: AppSelection,
    /// Accepted for compatibility with release pipelines; no effect on the plan
    pub for_release: bool,
    /// Skip the published-version comparison
    pub force: bool,
    /// Channel subset; empty means every channel
    pub channels: Vec<String>,
}

pub struct AppAggregator {
    fs: Arc<dyn FileSystem>,
    engine: MatrixEngine,
    apps_root: PathBuf,
    concurrency: usize,
}

impl AppAggregator {
    pub fn new(fs: Arc<dyn FileSystem>, engine: MatrixEngine, apps_root: PathBuf) -> Self {
        Self {
            fs,
            engine,
            apps_root,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Number of apps processed at once; output order is unaffected
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// App directories under the apps root, sorted by name
    pub fn discover_apps(&self) -> Result<Vec<String>, AggregateError> {
        let entries = self
            .fs
            .read_dir(&self.apps_root)
            .map_err(|e| AggregateError::Discovery {
                root: self.apps_root.clone(),
                message: format!("{:#}", e),
            })?;

        let mut apps: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.is_dir())
            .map(|entry| entry.name)
            .collect();
        apps.sort();

        Ok(apps)
    }

    /// Build the plan for every requested app, merged in request order
    pub async fn run(&self, request: &RunRequest) -> Result<BuildPlan, AggregateError> {
        let apps = match &request.apps {
            AppSelection::All => self.discover_apps()?,
            AppSelection::Named(apps) => apps.clone(),
        };

        debug!(
            apps = apps.len(),
            for_release = request.for_release,
            force = request.force,
            channels = ?request.channels,
            "Assembling build matrix"
        );

        let per_app: Vec<BuildPlan> = stream::iter(apps.iter())
            .map(|app| self.process_app(app, request))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut plan = BuildPlan::new();
        for app_plan in per_app {
            plan.extend(app_plan);
        }

        info!(
            images = plan.images.len(),
            platforms = plan.image_platforms.len(),
            "Build matrix assembled"
        );
        Ok(plan)
    }

    async fn process_app(&self, app: &str, request: &RunRequest) -> BuildPlan {
        let app_dir = self.apps_root.join(app);
        if !self.fs.is_dir(&app_dir) {
            error!(app, path = %app_dir.display(), "App not found");
            return BuildPlan::new();
        }

        let metadata = match AppMetadata::load(self.fs.as_ref(), &app_dir) {
            Ok(metadata) => metadata,
            Err(e) => {
                error!(app, "Error loading metadata: {}", e);
                return BuildPlan::new();
            }
        };

        self.engine
            .assemble(&app_dir, &metadata, &request.channels, request.force)
            .await
    }
}
