//! Filesystem-backed snapshot store.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/<set>/base.txt         common ancestor
//! <data_dir>/<set>/local.txt        client state
//! <data_dir>/<set>/remote.txt       backend state
//! <data_dir>/<set>/remote.rev       backend revision, decimal
//! <data_dir>/<set>/last_merge.json  report of the last merge
//! ```
//!
//! Missing files read as empty content and revision 0. Every write goes to a
//! temporary file first and is renamed into place.
//!
//! A commit stages all four files before renaming any of them, then renames
//! `local.txt`, `remote.txt`, `remote.rev` and `base.txt` in that order. If it
//! stops partway, base is never ahead of local, so the next merge sees the
//! resolved records on the local side and keeps them.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{ResolverError, Result};
use crate::store::{validate_set_name, CommitOutcome, RemoteSnapshot, Revision, SnapshotStore};

const BASE_FILE: &str = "base.txt";
const LOCAL_FILE: &str = "local.txt";
const REMOTE_FILE: &str = "remote.txt";
const REVISION_FILE: &str = "remote.rev";
const REPORT_FILE: &str = "last_merge.json";

/// A [`SnapshotStore`] over plain files.
///
/// Commits are only safe against other writers that go through the same
/// resolver process; the revision check is not atomic across processes.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one record set.
    pub fn set_dir(&self, set: &str) -> Result<PathBuf> {
        validate_set_name(set)?;
        Ok(self.root.join(set))
    }

    async fn read_file(&self, set: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.set_dir(set)?.join(name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Snapshot missing, treating as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_revision(&self, set: &str) -> Result<Revision> {
        let raw = self.read_file(set, REVISION_FILE).await?;
        let text = String::from_utf8_lossy(&raw);
        let text = text.trim();
        if text.is_empty() {
            return Ok(0);
        }
        text.parse().map_err(|_| ResolverError::CorruptRevision {
            set: set.to_string(),
            value: text.to_string(),
        })
    }

    async fn write_file(&self, set: &str, name: &str, content: &[u8]) -> Result<()> {
        let dir = self.set_dir(set)?;
        fs::create_dir_all(&dir).await?;

        let staged = stage(&dir, name, content).await?;
        staged.publish().await
    }
}

/// A temporary file waiting to be renamed over its target.
struct Staged {
    tmp: PathBuf,
    target: PathBuf,
}

impl Staged {
    async fn publish(&self) -> Result<()> {
        fs::rename(&self.tmp, &self.target).await?;
        Ok(())
    }

    async fn discard(&self) {
        if let Err(e) = fs::remove_file(&self.tmp).await {
            tracing::debug!(path = %self.tmp.display(), error = %e, "Could not remove staged file");
        }
    }
}

async fn stage(dir: &Path, name: &str, content: &[u8]) -> Result<Staged> {
    let tmp = dir.join(format!(".{}.tmp", name));
    fs::write(&tmp, content).await?;
    Ok(Staged {
        tmp,
        target: dir.join(name),
    })
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn fetch_base(&self, set: &str) -> Result<Vec<u8>> {
        self.read_file(set, BASE_FILE).await
    }

    async fn fetch_local(&self, set: &str) -> Result<Vec<u8>> {
        self.read_file(set, LOCAL_FILE).await
    }

    async fn fetch_remote(&self, set: &str) -> Result<RemoteSnapshot> {
        let revision = self.read_revision(set).await?;
        let content = self.read_file(set, REMOTE_FILE).await?;
        Ok(RemoteSnapshot { content, revision })
    }

    async fn commit(&self, set: &str, content: &[u8], expected: Revision) -> Result<CommitOutcome> {
        let current = self.read_revision(set).await?;
        if current != expected {
            return Ok(CommitOutcome::Conflict {
                current_revision: current,
            });
        }

        let revision = current + 1;
        let revision_text = revision.to_string();
        let dir = self.set_dir(set)?;
        fs::create_dir_all(&dir).await?;

        // Rename order matters: local first, base last
        let files: [(&str, &[u8]); 4] = [
            (LOCAL_FILE, content),
            (REMOTE_FILE, content),
            (REVISION_FILE, revision_text.as_bytes()),
            (BASE_FILE, content),
        ];

        let mut staged = Vec::with_capacity(files.len());
        for (name, bytes) in files {
            match stage(&dir, name, bytes).await {
                Ok(file) => staged.push(file),
                Err(e) => {
                    for file in &staged {
                        file.discard().await;
                    }
                    return Err(e);
                }
            }
        }

        for file in &staged {
            file.publish().await?;
        }

        tracing::debug!(set, revision, "Committed resolved snapshot");
        Ok(CommitOutcome::Committed { revision })
    }

    async fn write_report(&self, set: &str, report: &[u8]) -> Result<()> {
        self.write_file(set, REPORT_FILE, report).await
    }
}
