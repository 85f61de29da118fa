//! Conflict resolution driver.
//!
//! Fetches the three snapshots of a record set, merges them with the
//! engine and commits the result back. If the remote moves while a merge
//! is in flight, the commit is refused and the merge is redone against the
//! new remote. Base and local are fixed for the whole run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use taskmerge_engine::{KeyDecision, MergeEngine, MergeSummary, RecordCodec, SkippedLine};
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{ResolverError, Result};
use crate::store::{validate_set_name, CommitOutcome, Revision, SnapshotStore};

/// Tuning for [`ConflictResolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Merge-and-commit attempts before giving up; at least 1
    pub max_commit_attempts: u32,
    /// Hand a JSON report of each successful merge to the store
    pub write_report: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_commit_attempts: 3,
            write_report: true,
        }
    }
}

/// Lines dropped from each input while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkippedLines {
    pub base: Vec<SkippedLine>,
    pub local: Vec<SkippedLine>,
    pub remote: Vec<SkippedLine>,
}

impl SkippedLines {
    pub fn total(&self) -> usize {
        self.base.len() + self.local.len() + self.remote.len()
    }
}

/// What happened while resolving one record set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReport {
    pub run_id: Uuid,
    pub record_set: String,
    pub merged_at: DateTime<Utc>,
    /// Merge-and-commit rounds used, including the successful one
    pub attempts: u32,
    /// Remote revision after the commit
    pub revision: Revision,
    /// Records in the committed snapshot
    pub record_count: usize,
    pub summary: MergeSummary,
    pub decisions: Vec<KeyDecision>,
    pub skipped_lines: SkippedLines,
}

/// Resolves record sets against a [`SnapshotStore`].
///
/// Cheap to share behind an `Arc`. Merges of different record sets run
/// concurrently; merges of the same record set are serialized.
pub struct ConflictResolver<S> {
    store: S,
    options: ResolverOptions,
    /// One lock per record set, created on first use
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: SnapshotStore> ConflictResolver<S> {
    pub fn new(store: S, options: ResolverOptions) -> Self {
        Self {
            store,
            options,
            locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Merge and commit one record set.
    ///
    /// Read failures abort the run with nothing written; the caller should
    /// try the set again later.
    pub async fn resolve(&self, set: &str) -> Result<ResolveReport> {
        validate_set_name(set)?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("resolve", %run_id, record_set = %set);

        async move {
            let lock = self.lock_for(set);
            let _guard = lock.lock().await;

            let report = self.resolve_locked(set, run_id).await?;

            if self.options.write_report {
                let json = serde_json::to_vec_pretty(&report)?;
                self.store.write_report(set, &json).await?;
            }

            Ok(report)
        }
        .instrument(span)
        .await
    }

    fn lock_for(&self, set: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(set.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn resolve_locked(&self, set: &str, run_id: Uuid) -> Result<ResolveReport> {
        let base = RecordCodec::parse_bytes(&self.store.fetch_base(set).await?);
        let local = RecordCodec::parse_bytes(&self.store.fetch_local(set).await?);

        tracing::debug!(
            base = base.collection.len(),
            local = local.collection.len(),
            "Loaded local snapshots"
        );

        let max_attempts = self.options.max_commit_attempts.max(1);
        for attempt in 1..=max_attempts {
            let remote_snapshot = self.store.fetch_remote(set).await?;
            let remote = RecordCodec::parse_bytes(&remote_snapshot.content);

            let outcome = MergeEngine::resolve_with_report(
                &base.collection,
                &local.collection,
                &remote.collection,
            );
            let summary = outcome.report.summary();
            let content = RecordCodec::format(&outcome.resolved);

            tracing::debug!(
                attempt,
                remote = remote.collection.len(),
                revision = remote_snapshot.revision,
                "Merged against remote"
            );

            match self
                .store
                .commit(set, &content, remote_snapshot.revision)
                .await?
            {
                CommitOutcome::Committed { revision } => {
                    tracing::info!(
                        attempt,
                        revision,
                        records = outcome.resolved.len(),
                        from_local = summary.from_local,
                        from_remote = summary.from_remote,
                        removed = summary.removed,
                        conflicts = summary.conflicts,
                        "Record set resolved"
                    );

                    return Ok(ResolveReport {
                        run_id,
                        record_set: set.to_string(),
                        merged_at: Utc::now(),
                        attempts: attempt,
                        revision,
                        record_count: outcome.resolved.len(),
                        summary,
                        decisions: outcome.report.decisions,
                        skipped_lines: SkippedLines {
                            base: base.skipped.clone(),
                            local: local.skipped.clone(),
                            remote: remote.skipped,
                        },
                    });
                }
                CommitOutcome::Conflict { current_revision } => {
                    tracing::warn!(
                        attempt,
                        expected = remote_snapshot.revision,
                        current_revision,
                        "Remote changed during merge, merging again"
                    );
                }
            }
        }

        Err(ResolverError::CommitConflict {
            set: set.to_string(),
            attempts: max_attempts,
        })
    }
}
