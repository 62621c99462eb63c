//! Content loader - loads posts from the local posts directory

use anyhow::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::Post;
use crate::Site;

/// Loads published posts from the working tree
pub struct ContentLoader<'a> {
    site: &'a Site,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        Self { site }
    }

    /// Load every non-draft post that carries a slug, in directory order
    pub fn load_posts(&self) -> Result<Vec<Post>> {
        let posts_dir = &self.site.posts_dir;
        if !posts_dir.exists() {
            tracing::warn!("Posts directory {:?} does not exist", posts_dir);
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();

        for entry in WalkDir::new(posts_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }

            match load_post(path) {
                Ok(Some(post)) => posts.push(post),
                Ok(None) => tracing::debug!("Skipping {:?}", path),
                Err(e) => tracing::warn!("Failed to parse {:?}: {}", path, e),
            }
        }

        Ok(posts)
    }
}

/// Read one file; drafts and posts without a slug are skipped
fn load_post(path: &Path) -> Result<Option<Post>> {
    let raw = fs::read_to_string(path)?;
    let post = Post::from_document("", &raw)?;

    if post.draft || post.slug.is_empty() {
        return Ok(None);
    }

    Ok(Some(post))
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension().map(|e| e == "md").unwrap_or(false)
}
