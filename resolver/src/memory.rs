//! In-memory snapshot store for tests and embedding.
//!
//! [`MemoryStore`] keeps every record set in a `HashMap` behind a `RwLock`.
//! Data is lost when the store is dropped.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::Result;
use crate::store::{validate_set_name, CommitOutcome, RemoteSnapshot, Revision, SnapshotStore};

#[derive(Debug, Clone, Default)]
struct SetState {
    base: Vec<u8>,
    local: Vec<u8>,
    remote: Vec<u8>,
    revision: Revision,
    report: Option<Vec<u8>>,
}

/// An in-memory implementation of [`SnapshotStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: RwLock<HashMap<String, SetState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record set with its three snapshots.
    pub fn seed(&self, set: &str, base: &[u8], local: &[u8], remote: &[u8]) {
        let mut sets = self.write();
        sets.insert(
            set.to_string(),
            SetState {
                base: base.to_vec(),
                local: local.to_vec(),
                remote: remote.to_vec(),
                ..SetState::default()
            },
        );
    }

    /// Replace the remote snapshot as a concurrent writer would, bumping the revision.
    pub fn push_remote(&self, set: &str, content: &[u8]) -> Revision {
        let mut sets = self.write();
        let state = sets.entry(set.to_string()).or_default();
        state.remote = content.to_vec();
        state.revision += 1;
        state.revision
    }

    /// The `(base, local, remote)` snapshots of a set.
    pub fn snapshots(&self, set: &str) -> Option<(Vec<u8>, Vec<u8>, Vec<u8>)> {
        self.read()
            .get(set)
            .map(|s| (s.base.clone(), s.local.clone(), s.remote.clone()))
    }

    /// The last report written for a set.
    pub fn report(&self, set: &str) -> Option<Vec<u8>> {
        self.read().get(set).and_then(|s| s.report.clone())
    }

    // A panic while holding the lock cannot leave a half-written SetState.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SetState>> {
        self.sets.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SetState>> {
        self.sets.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn fetch_base(&self, set: &str) -> Result<Vec<u8>> {
        validate_set_name(set)?;
        Ok(self.read().get(set).map(|s| s.base.clone()).unwrap_or_default())
    }

    async fn fetch_local(&self, set: &str) -> Result<Vec<u8>> {
        validate_set_name(set)?;
        Ok(self.read().get(set).map(|s| s.local.clone()).unwrap_or_default())
    }

    async fn fetch_remote(&self, set: &str) -> Result<RemoteSnapshot> {
        validate_set_name(set)?;
        Ok(self
            .read()
            .get(set)
            .map(|s| RemoteSnapshot {
                content: s.remote.clone(),
                revision: s.revision,
            })
            .unwrap_or(RemoteSnapshot {
                content: Vec::new(),
                revision: 0,
            }))
    }

    async fn commit(&self, set: &str, content: &[u8], expected: Revision) -> Result<CommitOutcome> {
        validate_set_name(set)?;
        let mut sets = self.write();
        let state = sets.entry(set.to_string()).or_default();

        if state.revision != expected {
            return Ok(CommitOutcome::Conflict {
                current_revision: state.revision,
            });
        }

        state.remote = content.to_vec();
        state.base = content.to_vec();
        state.local = content.to_vec();
        state.revision += 1;

        Ok(CommitOutcome::Committed {
            revision: state.revision,
        })
    }

    async fn write_report(&self, set: &str, report: &[u8]) -> Result<()> {
        validate_set_name(set)?;
        self.write().entry(set.to_string()).or_default().report = Some(report.to_vec());
        Ok(())
    }
}
