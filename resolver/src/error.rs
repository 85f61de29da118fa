//! Unified error handling for the resolver.

/// Resolver error type.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] taskmerge_engine::Error),

    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),

    #[error("Invalid record set name: {0:?}")]
    InvalidRecordSet(String),

    #[error("Corrupt revision for record set {set}: {value:?}")]
    CorruptRevision { set: String, value: String },

    #[error("Record set {set} still conflicted after {attempts} commit attempts")]
    CommitConflict { set: String, attempts: u32 },
}

impl ResolverError {
    /// Whether retrying the whole record set later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ResolverError::Io(_) | ResolverError::Engine(_) | ResolverError::CommitConflict { .. }
        )
    }
}

/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, ResolverError>;
