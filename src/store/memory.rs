//! In-process content store
//!
//! Behaves like the GitHub backend for hashes and conflicts, and counts every
//! call so callers can check that nothing reached the store.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{ContentStore, EntryKind, RemoteEntry, RemoteFile};
use crate::error::{CmsError, Result};

#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<IndexMap<String, String>>,
    failing_reads: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without counting a call
    pub fn insert(&self, path: &str, content: &str) {
        self.lock_files().insert(path.to_string(), content.to_string());
    }

    /// Raw content of a file, bypassing the call counter
    pub fn contents(&self, path: &str) -> Option<String> {
        self.lock_files().get(path).cloned()
    }

    /// Make every read of `path` fail with a remote error
    pub fn fail_reads_of(&self, path: &str) {
        self.failing_reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string());
    }

    /// Make every delete of `path` fail with a remote error
    pub fn fail_deletes_of(&self, path: &str) {
        self.failing_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string());
    }

    /// Number of trait calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn track(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn lock_files(&self) -> std::sync::MutexGuard<'_, IndexMap<String, String>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn hash_content(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>> {
        self.track();
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        Ok(self
            .lock_files()
            .keys()
            .filter_map(|path| {
                let name = path.strip_prefix(&prefix)?;
                (!name.contains('/')).then(|| RemoteEntry {
                    name: name.to_string(),
                    path: path.clone(),
                    kind: EntryKind::File,
                })
            })
            .collect())
    }

    async fn read(&self, path: &str) -> Result<Option<RemoteFile>> {
        self.track();
        let failing = self
            .failing_reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(path);
        if failing {
            return Err(CmsError::remote(format!("Content is not UTF-8: {}", path)));
        }

        Ok(self.lock_files().get(path).map(|content| RemoteFile {
            path: path.to_string(),
            sha: hash_content(content),
            content: content.clone(),
        }))
    }

    async fn fetch_hash(&self, path: &str) -> Result<Option<String>> {
        self.track();
        Ok(self.lock_files().get(path).map(|c| hash_content(c)))
    }

    async fn write(&self, path: &str, content: &str, expected_hash: Option<&str>) -> Result<()> {
        self.track();
        let mut files = self.lock_files();
        let current = files.get(path).map(|c| hash_content(c));

        match (current.as_deref(), expected_hash) {
            (Some(_), None) => {
                return Err(CmsError::remote(format!(
                    "Invalid request. \"sha\" wasn't supplied for {}",
                    path
                )))
            }
            (current, Some(expected)) if current != Some(expected) => {
                return Err(CmsError::remote(format!("{} does not match {}", path, expected)))
            }
            _ => {}
        }

        files.insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        if self.fetch_hash(path).await?.is_none() {
            return Err(CmsError::not_found("File not found"));
        }

        self.track();
        let failing = self
            .failing_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(path);
        if failing {
            return Err(CmsError::remote("Failed to delete file: 500"));
        }

        self.lock_files().shift_remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_requires_current_hash() {
        let store = MemoryStore::new();
        store.write("a.md", "one", None).await.unwrap();

        let err = store.write("a.md", "two", None).await.unwrap_err();
        assert!(matches!(err, CmsError::Remote(_)));

        let err = store.write("a.md", "two", Some("stale")).await.unwrap_err();
        assert!(matches!(err, CmsError::Remote(_)));

        let sha = store.fetch_hash("a.md").await.unwrap().unwrap();
        store.write("a.md", "two", Some(&sha)).await.unwrap();
        assert_eq!(store.contents("a.md").as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_list_is_one_level_in_insert_order() {
        let store = MemoryStore::new();
        store.insert("posts/b.md", "b");
        store.insert("posts/a.md", "a");
        store.insert("posts/img/x.png", "x");
        store.insert("other/c.md", "c");

        let names: Vec<_> = store
            .list("posts")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["b.md", "a.md"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.insert("a.md", "a");
        store.insert("b.md", "b");
        store.fail_deletes_of("b.md");

        store.delete("a.md").await.unwrap();
        assert!(store.contents("a.md").is_none());

        assert!(matches!(store.delete("a.md").await, Err(CmsError::NotFound(_))));
        assert!(matches!(store.delete("b.md").await, Err(CmsError::Remote(_))));
        assert!(store.contents("b.md").is_some());
    }
}
