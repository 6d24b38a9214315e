//! buildmatrix - build matrix generator for multi-app container image pipelines
//!
//! A monorepo holds one directory per application under an apps root. Each
//! app describes its release channels in `ci/metadata.yaml` and ships a
//! `latest.sh` probe that prints the newest upstream version. buildmatrix
//! compares that version with the tag already published to the GitHub
//! container registry and emits a plan of the images, and the per-platform
//! builds, that are out of date.
//!
//! # Example Usage
//!
//! ```ignore
//! use buildmatrix::{AppAggregator, AppSelection, MatrixEngine, RunRequest};
//! use buildmatrix::fs::{FileSystem, RealFileSystem};
//! use buildmatrix::probe::ScriptProbe;
//! use buildmatrix::registry::GithubPackages;
//! use std::sync::Arc;
//!
//! let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
//! let lookup = GithubPackages::new(Some("acme".into()), None)?;
//! let engine = MatrixEngine::new(fs.clone(), Arc::new(ScriptProbe::new(fs.clone())), Arc::new(lookup));
//! let plan = AppAggregator::new(fs, engine, "apps".into())
//!     .run(&RunRequest {
//!         apps: AppSelection::All,
//!         for_release: false,
//!         force: false,
//!         channels: vec![],
//!     })
//!     .await?;
//! println!("{}", serde_json::to_string(&plan)?);
//! ```
//!
//! # Project Structure
//!
//! - [`metadata`]: app descriptors and platform parsing
//! - [`probe`]: upstream version discovery
//! - [`registry`]: published version lookup
//! - [`matrix`]: per-app decisions and cross-app aggregation

pub mod cli;
pub mod config;
pub mod fs;
pub mod matrix;
pub mod metadata;
pub mod probe;
pub mod registry;
pub mod util;

pub use config::{ConfigError, MatrixConfig, RegistryCredentials};
pub use matrix::{
    AggregateError, AppAggregator, AppSelection, BuildPlan, Image, MatrixEngine, PlatformBuild,
    RunRequest,
};
pub use metadata::{AppMetadata, Channel, MetadataError, Platform};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
