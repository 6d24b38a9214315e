//! Filesystem seam for the apps tree.
//!
//! Everything that inspects `apps/<app>/...` (descriptor loading, probe
//! location, Dockerfile resolution, app discovery) goes through
//! [`FileSystem`] so decisions can be tested against an in-memory tree.

mod mock;
mod real;
mod r#trait;

pub use mock::MockFileSystem;
pub use r#trait::{DirEntry, FileSystem, FileType};
pub use real::RealFileSystem;
