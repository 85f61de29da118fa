//! The [`SnapshotStore`] trait: where the three merge inputs come from and
//! where the resolved list goes.
//!
//! The resolver never talks to a backend directly. Anything that can hand
//! out the base, local and remote snapshots of a record set and accept a
//! conditional write of the result can drive a merge.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Monotonic version of the remote snapshot.
pub type Revision = u64;

/// The backend's copy of a record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    /// Serialized records in the line format
    pub content: Vec<u8>,
    /// Revision the content was read at
    pub revision: Revision,
}

/// Result of a conditional commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum CommitOutcome {
    /// Written; the remote is now at `revision`
    Committed { revision: Revision },
    /// The remote moved since it was fetched; nothing was written
    Conflict { current_revision: Revision },
}

/// Source of merge inputs and sink for the resolved snapshot.
///
/// Implementations must be thread-safe (`Send + Sync`). A record set that
/// has never been written reads as empty content.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Local state as of the last successful sync (the common ancestor).
    async fn fetch_base(&self, set: &str) -> Result<Vec<u8>>;

    /// Local state at the time synchronization was requested.
    async fn fetch_local(&self, set: &str) -> Result<Vec<u8>>;

    /// Current remote state.
    async fn fetch_remote(&self, set: &str) -> Result<RemoteSnapshot>;

    /// Write `content` as the new remote state, only if the remote is still
    /// at `expected`. On success base and local become `content` as well.
    async fn commit(&self, set: &str, content: &[u8], expected: Revision) -> Result<CommitOutcome>;

    /// Persist a JSON merge report next to the record set.
    ///
    /// Stores without a place for reports may ignore it.
    async fn write_report(&self, _set: &str, _report: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Reject names that could escape the store's namespace.
///
/// Accepts ASCII letters, digits, `-` and `_`.
pub fn validate_set_name(set: &str) -> Result<()> {
    let valid = !set.is_empty()
        && set
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(crate::error::ResolverError::InvalidRecordSet(set.to_string()))
    }
}
