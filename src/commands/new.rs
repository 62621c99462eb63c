//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::content::PostInput;
use crate::Site;

/// Write a new post skeleton to the posts directory and return its path
pub fn create_post(site: &Site, title: &str, slug: Option<&str>, draft: bool) -> Result<PathBuf> {
    let slug = slug
        .map(str::to_string)
        .unwrap_or_else(|| slug::slugify(title));

    let input = PostInput {
        slug,
        title: title.to_string(),
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        draft: Some(draft),
        ..Default::default()
    };
    input.validate()?;

    fs::create_dir_all(&site.posts_dir)?;
    let file_path = site.posts_dir.join(format!("{}.md", input.slug));

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    fs::write(&file_path, input.to_document())?;
    tracing::info!("Created {:?}", file_path);

    Ok(file_path)
}
