//! Three-way merge of record collections.
//!
//! This is the conflict resolver. Given the common ancestor (`base`), the
//! client's current state (`local`) and the backend's current state
//! (`remote`), it produces one resolved collection.
//!
//! # Algorithm
//!
//! 1. Collect the union of keys across all three inputs
//! 2. Classify each key independently by presence and value equality
//! 3. Keep the record chosen by the classification, or drop it
//!
//! # Policy
//!
//! | base | local | remote | result |
//! |------|-------|--------|--------|
//! | yes | yes | changed | remote |
//! | yes | changed | unchanged | local |
//! | yes | unchanged | unchanged | base |
//! | yes | missing | any | absent |
//! | yes | any | missing | absent |
//! | no | yes | no | local |
//! | no | no | yes | remote |
//! | no | yes | yes, equal | local |
//! | no | yes | yes, different | remote |
//!
//! Remote wins modifications and concurrent creations. A deletion on
//! either side always removes the record, even if the other side edited it.

use crate::{Record, RecordCollection, RecordKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which input a resolved record was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Base,
    Local,
    Remote,
}

/// How a single key was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    /// Neither side touched the record
    Unchanged,
    /// Edited locally, remote untouched
    LocalEdit,
    /// Edited remotely; local was untouched or made the same edit
    RemoteEdit,
    /// Edited differently on both sides; the local edit is discarded
    ConcurrentEdit,
    /// Removed locally, regardless of what remote did
    LocalDeletion,
    /// Removed remotely, regardless of what local did
    RemoteDeletion,
    /// Removed on both sides
    BothDeleted,
    /// New on the local side only
    LocalCreation,
    /// New on the remote side only
    RemoteCreation,
    /// New on both sides with identical content
    IdenticalCreation,
    /// New on both sides with different content; the local record is discarded
    ConflictingCreation,
}

impl Decision {
    /// The input the resolved record comes from, or `None` if the key is dropped.
    pub fn source(self) -> Option<Side> {
        match self {
            Decision::Unchanged => Some(Side::Base),
            Decision::LocalEdit | Decision::LocalCreation | Decision::IdenticalCreation => {
                Some(Side::Local)
            }
            Decision::RemoteEdit
            | Decision::ConcurrentEdit
            | Decision::RemoteCreation
            | Decision::ConflictingCreation => Some(Side::Remote),
            Decision::LocalDeletion | Decision::RemoteDeletion | Decision::BothDeleted => None,
        }
    }

    /// True if a diverging local value lost to the remote one.
    pub fn is_conflict(self) -> bool {
        matches!(self, Decision::ConcurrentEdit | Decision::ConflictingCreation)
    }

    /// True if the key is absent from the result.
    pub fn is_removal(self) -> bool {
        self.source().is_none()
    }
}

/// The resolution of one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDecision {
    pub key: RecordKey,
    pub decision: Decision,
}

/// Per-key trace of a merge, in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub decisions: Vec<KeyDecision>,
}

/// Counts of how keys were resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    /// Distinct keys across the three inputs
    pub total: usize,
    pub unchanged: usize,
    pub from_local: usize,
    pub from_remote: usize,
    pub removed: usize,
    /// Keys where a local change was discarded in favour of remote
    pub conflicts: usize,
}

impl MergeReport {
    /// Decisions where a local change lost to remote.
    pub fn conflicts(&self) -> impl Iterator<Item = &KeyDecision> {
        self.decisions.iter().filter(|d| d.decision.is_conflict())
    }

    /// Look up the decision for a key.
    pub fn decision_for(&self, key: &str) -> Option<Decision> {
        self.decisions
            .iter()
            .find(|d| d.key == key)
            .map(|d| d.decision)
    }

    pub fn summary(&self) -> MergeSummary {
        let mut summary = MergeSummary {
            total: self.decisions.len(),
            ..MergeSummary::default()
        };

        for d in &self.decisions {
            match d.decision.source() {
                Some(Side::Base) => summary.unchanged += 1,
                Some(Side::Local) => summary.from_local += 1,
                Some(Side::Remote) => summary.from_remote += 1,
                None => summary.removed += 1,
            }
            if d.decision.is_conflict() {
                summary.conflicts += 1;
            }
        }

        summary
    }
}

/// Result of a merge with its trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub resolved: RecordCollection,
    pub report: MergeReport,
}

/// The three-way merge engine.
///
/// Stateless; safe to call from any number of threads at once.
pub struct MergeEngine;

impl MergeEngine {
    /// Merge `local` and `remote`, both derived from `base`.
    ///
    /// Inputs are never modified. Every key in the union of the three
    /// inputs is resolved; there is no failure case.
    pub fn resolve(
        base: &RecordCollection,
        local: &RecordCollection,
        remote: &RecordCollection,
    ) -> RecordCollection {
        Self::resolve_with_report(base, local, remote).resolved
    }

    /// Merge and keep a per-key record of each decision.
    pub fn resolve_with_report(
        base: &RecordCollection,
        local: &RecordCollection,
        remote: &RecordCollection,
    ) -> MergeOutcome {
        let keys: BTreeSet<&RecordKey> = base
            .keys()
            .chain(local.keys())
            .chain(remote.keys())
            .collect();

        let mut resolved = RecordCollection::new();
        let mut decisions = Vec::with_capacity(keys.len());

        for key in keys {
            let b = base.get(key);
            let l = local.get(key);
            let r = remote.get(key);

            let Some(decision) = classify(b, l, r) else {
                continue;
            };
            tracing::trace!(key = %key, ?decision, "Resolved key");

            let winner = match decision.source() {
                Some(Side::Base) => b,
                Some(Side::Local) => l,
                Some(Side::Remote) => r,
                None => None,
            };
            if let Some(record) = winner {
                resolved.insert(record.clone());
            }

            decisions.push(KeyDecision {
                key: key.clone(),
                decision,
            });
        }

        let report = MergeReport { decisions };
        let summary = report.summary();
        tracing::debug!(
            total = summary.total,
            from_local = summary.from_local,
            from_remote = summary.from_remote,
            removed = summary.removed,
            conflicts = summary.conflicts,
            "Merge complete"
        );

        MergeOutcome { resolved, report }
    }
}

/// Classify one key from its presence and value in each input.
///
/// Returns `None` for a key absent from all three.
fn classify(
    base: Option<&Record>,
    local: Option<&Record>,
    remote: Option<&Record>,
) -> Option<Decision> {
    let decision = match (base, local, remote) {
        // Deletions are absolute and checked before any modification.
        (Some(_), None, None) => Decision::BothDeleted,
        (Some(_), None, Some(_)) => Decision::LocalDeletion,
        (Some(_), Some(_), None) => Decision::RemoteDeletion,

        (Some(b), Some(l), Some(r)) => {
            if r != b {
                if l != b && l != r {
                    Decision::ConcurrentEdit
                } else {
                    Decision::RemoteEdit
                }
            } else if l != b {
                Decision::LocalEdit
            } else {
                Decision::Unchanged
            }
        }

        (None, Some(_), None) => Decision::LocalCreation,
        (None, None, Some(_)) => Decision::RemoteCreation,
        (None, Some(l), Some(r)) => {
            if l == r {
                Decision::IdenticalCreation
            } else {
                Decision::ConflictingCreation
            }
        }

        (None, None, None) => return None,
    };
    Some(decision)
}
