//! Remote content store
//!
//! A store holds whole files addressed by repository path. Every stored blob
//! has a content hash; writes that replace a file must present the hash they
//! read, so a concurrent edit makes the write fail instead of being lost.

mod github;
mod memory;

pub use github::GithubStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// Kind of a directory listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    #[serde(other)]
    Other,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// A stored file and the hash of the version that was read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub sha: String,
    pub content: String,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// List a directory in store order. A missing directory is empty.
    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>>;

    /// Read a file as UTF-8 text; `None` when it does not exist.
    async fn read(&self, path: &str) -> Result<Option<RemoteFile>>;

    /// Current hash of a file; `None` when it does not exist.
    async fn fetch_hash(&self, path: &str) -> Result<Option<String>>;

    /// Create (`expected_hash == None`) or replace a file.
    async fn write(&self, path: &str, content: &str, expected_hash: Option<&str>) -> Result<()>;

    /// Delete a file, failing with `NotFound` when it is absent.
    async fn delete(&self, path: &str) -> Result<()>;
}
