//! Post repository - posts addressed by slug on top of a content store
//!
//! Every operation reads fresh state from the store. Renames take two remote
//! calls and are not atomic: the new file is written first and the old one
//! deleted afterwards. If the delete fails the new file is removed again; if
//! that rollback also fails, both files exist until someone cleans up.

use std::sync::Arc;

use crate::content::{is_valid_slug, FrontMatter, Post, PostInput, PostSummary};
use crate::error::{CmsError, Result};
use crate::store::{ContentStore, EntryKind};

/// Directory holding `{slug}.md` files in the content repository
pub const POSTS_DIR: &str = "content/posts";

#[derive(Clone)]
pub struct PostRepository {
    store: Arc<dyn ContentStore>,
    posts_dir: String,
}

impl PostRepository {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            posts_dir: POSTS_DIR.to_string(),
        }
    }

    /// Canonical path of a post file
    pub fn post_path(&self, slug: &str) -> String {
        format!("{}/{}.md", self.posts_dir, slug)
    }

    /// Summaries of every post, drafts included, in store listing order.
    ///
    /// Files that cannot be read or have no readable header are skipped.
    pub async fn list(&self) -> Result<Vec<PostSummary>> {
        let entries = self.store.list(&self.posts_dir).await?;
        let mut posts = Vec::new();

        for entry in entries
            .into_iter()
            .filter(|e| e.kind == EntryKind::File && e.name.ends_with(".md"))
        {
            let file = match self.store.read(&entry.path).await {
                Ok(Some(file)) => file,
                Ok(None) => {
                    tracing::warn!("{} disappeared while listing", entry.path);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.path, e);
                    continue;
                }
            };

            match FrontMatter::parse(&file.content) {
                Ok((fm, _)) => posts.push(PostSummary::from_front_matter(fm, &entry.name)),
                Err(e) => tracing::warn!("Skipping {}: {}", entry.path, e),
            }
        }

        tracing::debug!("Listed {} posts", posts.len());
        Ok(posts)
    }

    /// Fetch one post with its body. Drafts are returned too.
    pub async fn get(&self, slug: &str) -> Result<Post> {
        if !is_valid_slug(slug) {
            return Err(CmsError::not_found("Post not found"));
        }

        let file = self
            .store
            .read(&self.post_path(slug))
            .await?
            .ok_or_else(|| CmsError::not_found("Post not found"))?;

        Post::from_document(slug, &file.content)
    }

    /// Create, update or rename a post.
    ///
    /// Validation happens before any store call.
    pub async fn save(&self, input: &PostInput) -> Result<()> {
        input.validate()?;
        let existing = input.existing_slug.as_deref().filter(|s| !s.is_empty());
        if existing.is_some_and(|s| !is_valid_slug(s)) {
            return Err(CmsError::validation("Invalid existing slug"));
        }

        let path = self.post_path(&input.slug);
        let document = input.to_document();

        match existing {
            Some(old) if old == input.slug => {
                let sha = self.store.fetch_hash(&path).await?;
                self.store.write(&path, &document, sha.as_deref()).await
            }
            Some(old) => self.rename(old, &path, &document).await,
            None => self.store.write(&path, &document, None).await,
        }
    }

    async fn rename(&self, old_slug: &str, new_path: &str, document: &str) -> Result<()> {
        let old_path = self.post_path(old_slug);
        if self.store.fetch_hash(&old_path).await?.is_none() {
            return Err(CmsError::not_found("File not found"));
        }

        self.store.write(new_path, document, None).await?;

        if let Err(e) = self.store.delete(&old_path).await {
            tracing::error!("Rename failed deleting {}: {}", old_path, e);
            if let Err(rollback) = self.store.delete(new_path).await {
                tracing::error!(
                    "Rollback of {} failed, both {} and {} exist: {}",
                    new_path,
                    old_path,
                    new_path,
                    rollback
                );
            }
            return Err(e);
        }

        tracing::info!("Renamed {} to {}", old_path, new_path);
        Ok(())
    }

    /// Delete a post by slug
    pub async fn delete(&self, slug: &str) -> Result<()> {
        if !is_valid_slug(slug) {
            return Err(CmsError::not_found("File not found"));
        }
        self.store.delete(&self.post_path(slug)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, PostRepository) {
        let store = Arc::new(MemoryStore::new());
        let repo = PostRepository::new(store.clone());
        (store, repo)
    }

    fn input(slug: &str) -> PostInput {
        PostInput {
            slug: slug.to_string(),
            title: format!("Title of {}", slug),
            date: "2024-02-01".to_string(),
            content: format!("Body of {}", slug),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let (_store, repo) = setup();
        let saved = PostInput {
            tags: Some(vec!["rust".to_string(), "blog".to_string()]),
            summary: Some("A summary".to_string()),
            draft: Some(true),
            content: "# Heading\n\n한국어 본문\n\n---\n\nEnd".to_string(),
            ..input("hello-world")
        };
        repo.save(&saved).await.unwrap();

        let post = repo.get("hello-world").await.unwrap();
        assert_eq!(post.slug, saved.slug);
        assert_eq!(post.title, saved.title);
        assert_eq!(post.date, saved.date);
        assert_eq!(post.summary, saved.summary);
        assert!(post.draft);
        assert_eq!(post.content, saved.content);
        // Block-list tags are written but not read back
        assert!(post.tags.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_slug_never_reaches_store() {
        let (store, repo) = setup();
        for slug in ["My Post!", "UPPER", ""] {
            let err = repo.save(&input(slug)).await.unwrap_err();
            assert!(matches!(err, CmsError::Validation(_)), "{}", slug);
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let (store, repo) = setup();
        let post = PostInput {
            title: String::new(),
            ..input("ok")
        };
        assert!(matches!(repo.save(&post).await, Err(CmsError::Validation(_))));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_uses_current_hash() {
        let (store, repo) = setup();
        repo.save(&input("post")).await.unwrap();

        let edited = PostInput {
            title: "New title".to_string(),
            existing_slug: Some("post".to_string()),
            ..input("post")
        };
        repo.save(&edited).await.unwrap();

        assert_eq!(repo.get("post").await.unwrap().title, "New title");
        assert!(store.contents("content/posts/post.md").is_some());
    }

    #[tokio::test]
    async fn test_create_over_existing_file_fails() {
        let (_store, repo) = setup();
        repo.save(&input("post")).await.unwrap();
        let err = repo.save(&input("post")).await.unwrap_err();
        assert!(matches!(err, CmsError::Remote(_)));
    }

    #[tokio::test]
    async fn test_rename_moves_file() {
        let (store, repo) = setup();
        repo.save(&input("old")).await.unwrap();

        let renamed = PostInput {
            existing_slug: Some("old".to_string()),
            ..input("new")
        };
        repo.save(&renamed).await.unwrap();

        assert!(store.contents("content/posts/old.md").is_none());
        let post = repo.get("new").await.unwrap();
        assert_eq!(post.slug, "new");
        assert_eq!(post.content, "Body of new");
    }

    #[tokio::test]
    async fn test_rename_failure_leaves_no_new_file() {
        let (store, repo) = setup();
        repo.save(&input("old")).await.unwrap();
        store.fail_deletes_of("content/posts/old.md");

        let renamed = PostInput {
            existing_slug: Some("old".to_string()),
            ..input("new")
        };
        let err = repo.save(&renamed).await.unwrap_err();

        assert!(matches!(err, CmsError::Remote(_)));
        assert!(store.contents("content/posts/new.md").is_none());
        assert!(store.contents("content/posts/old.md").is_some());
    }

    #[tokio::test]
    async fn test_rename_of_missing_post() {
        let (store, repo) = setup();
        let renamed = PostInput {
            existing_slug: Some("ghost".to_string()),
            ..input("new")
        };
        let err = repo.save(&renamed).await.unwrap_err();

        assert!(matches!(err, CmsError::NotFound(_)));
        assert!(store.contents("content/posts/new.md").is_none());
    }

    #[tokio::test]
    async fn test_invalid_existing_slug() {
        let (store, repo) = setup();
        let renamed = PostInput {
            existing_slug: Some("../secrets".to_string()),
            ..input("new")
        };
        assert!(matches!(repo.save(&renamed).await, Err(CmsError::Validation(_))));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, repo) = setup();
        repo.save(&input("post")).await.unwrap();

        repo.delete("post").await.unwrap();
        assert!(store.contents("content/posts/post.md").is_none());

        assert!(matches!(repo.delete("post").await, Err(CmsError::NotFound(_))));
        assert!(matches!(repo.delete("never-was").await, Err(CmsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_missing_or_malformed() {
        let (store, repo) = setup();
        store.insert("content/posts/broken.md", "just text");

        assert!(matches!(repo.get("missing").await, Err(CmsError::NotFound(_))));
        assert!(matches!(repo.get("broken").await, Err(CmsError::Format(_))));
    }

    #[tokio::test]
    async fn test_list_keeps_store_order_and_skips_bad_files() {
        let (store, repo) = setup();
        store.insert(
            "content/posts/zeta.md",
            "---\ntitle: \"Zeta\"\ndate: \"2024-01-01\"\nslug: \"zeta\"\n---\n\nz",
        );
        store.insert("content/posts/broken.md", "no header");
        store.insert(
            "content/posts/alpha.md",
            "---\ntitle: \"Alpha\"\ndate: \"2024-05-01\"\ndraft: true\n---\n\na",
        );
        store.insert("content/posts/readme.txt", "---\ntitle: x\n---\n");

        let posts = repo.list().await.unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["zeta", "alpha"]);
        assert!(posts[1].draft);
        assert_eq!(posts[1].title, "Alpha");
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_files() {
        let (store, repo) = setup();
        store.insert("content/posts/a.md", "---\ntitle: \"A\"\n---\n\na");
        store.insert("content/posts/huge.md", "---\ntitle: \"Huge\"\n---\n\nh");
        store.insert("content/posts/b.md", "---\ntitle: \"B\"\n---\n\nb");
        store.fail_reads_of("content/posts/huge.md");

        let posts = repo.list().await.unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_draft_still_retrievable() {
        let (_store, repo) = setup();
        let draft = PostInput {
            draft: Some(true),
            ..input("secret")
        };
        repo.save(&draft).await.unwrap();
        assert!(repo.get("secret").await.unwrap().draft);
    }
}
