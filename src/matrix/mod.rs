//! Build matrix assembly.
//!
//! For each app, [`MatrixEngine`] walks the selected channels, resolves the
//! upstream version, compares it with what is already published and expands
//! the channels that need a rebuild into one [`PlatformBuild`] per platform.
//! [`AppAggregator`] drives the engine over every requested app and merges
//! the per-app results, in request order, into one [`BuildPlan`].

pub mod aggregator;
pub mod channels;
pub mod engine;
pub mod plan;

pub use aggregator::{split_list, AggregateError, AppAggregator, AppSelection, RunRequest};
pub use channels::select_channels;
pub use engine::{ChannelDecision, MatrixEngine, SkipReason};
pub use plan::{BuildPlan, Image, PlatformBuild, LABEL_TYPE, LATEST_TAG};
