//! # Taskmerge Engine
//!
//! A deterministic three-way merge engine for task lists.
//!
//! This crate resolves a named-record collection that diverged in two places
//! (the local client and the remote backend) from a common ancestor. It has
//! no knowledge of how the three snapshots were obtained or where the result
//! goes; that is the job of the surrounding service.
//!
//! ## Design Principles
//!
//! - **No IO**: the codec transforms buffers and readers handed to it, the
//!   merge works on in-memory collections
//! - **Deterministic**: same inputs always produce the same outputs
//! - **Total**: every key in the union of the inputs is resolved, merging
//!   never fails
//! - **Tolerant**: one corrupt line never prevents loading the rest
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Record`] is a `key` plus a `payload`. Identity is by key, change
//! detection is by value. A [`RecordCollection`] maps keys to records.
//! There are no tombstones: a deletion is inferred from absence.
//!
//! ### Codec
//!
//! [`RecordCodec`] converts between collections and the line format
//! `key|payload|\r\n`. Malformed lines are reported in [`ParseOutcome::skipped`]
//! and parsing continues.
//!
//! ### Merge
//!
//! [`MergeEngine`] applies a fixed per-key policy: remote edits and
//! conflicting concurrent creations win, local edits survive an untouched
//! remote, and a deletion on either side always removes the record.
//!
//! ## Quick Start
//!
//! ```rust
//! use taskmerge_engine::{MergeEngine, RecordCodec};
//!
//! let base = RecordCodec::parse_bytes(b"Task1|Aaa|\r\nTask2|Bbb|\r\n").collection;
//! let local = RecordCodec::parse_bytes(b"Task1|Aaa|\r\nTask2|Bbb|\r\nTask3|Ccc|\r\n").collection;
//! let remote = RecordCodec::parse_bytes(b"Task1|Changed|\r\n").collection;
//!
//! let resolved = MergeEngine::resolve(&base, &local, &remote);
//!
//! assert_eq!(
//!     RecordCodec::format(&resolved),
//!     b"Task1|Changed|\r\nTask3|Ccc|\r\n".to_vec()
//! );
//! ```
//!
//! ## FFI
//!
//! The [`ffi`] module exposes the merge to other languages (Kotlin, Swift,
//! Dart). All data crosses the boundary as strings.

pub mod codec;
pub mod error;
pub mod ffi;
pub mod merge;
pub mod record;

// Re-export main types at crate root
pub use codec::{
    ParseOutcome, RecordCodec, SkipReason, SkippedLine, FIELD_SEPARATOR, LINE_TERMINATOR,
};
pub use error::Error;
pub use merge::{Decision, KeyDecision, MergeEngine, MergeOutcome, MergeReport, MergeSummary, Side};
pub use record::{Record, RecordCollection};

/// Identity of a record within a collection.
pub type RecordKey = String;
