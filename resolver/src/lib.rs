//! Taskmerge Resolver - conflict resolution service for task lists.
//!
//! Drives the taskmerge-engine merge for one or more record sets: fetches
//! the base, local and remote snapshots from a [`SnapshotStore`], merges
//! them and commits the result back with a revision check.

pub mod config;
pub mod error;
pub mod fs_store;
pub mod memory;
pub mod resolver;
pub mod store;

pub use config::{Config, ConfigError};
pub use error::{ResolverError, Result};
pub use fs_store::FileStore;
pub use memory::MemoryStore;
pub use resolver::{ConflictResolver, ResolveReport, ResolverOptions, SkippedLines};
pub use store::{CommitOutcome, RemoteSnapshot, Revision, SnapshotStore};
