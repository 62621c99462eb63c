//! List published posts

use anyhow::Result;

use crate::content::loader::ContentLoader;
use crate::content::{sort_newest_first, Post};
use crate::Site;

/// Print published posts, newest first
pub fn run(site: &Site) -> Result<()> {
    let mut posts = ContentLoader::new(site).load_posts()?;
    sort_newest_first(&mut posts);

    println!("Posts ({}):", posts.len());
    for post in &posts {
        println!("  {}", format_line(post));
    }

    Ok(())
}

fn format_line(post: &Post) -> String {
    let date = post
        .published_at()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "????-??-??".to_string());
    format!("{} - {} [{}]", date, post.title, post.slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let post = Post::from_document(
            "x",
            "---\ntitle: \"Hello\"\ndate: \"2024-01-15 10:00\"\nslug: \"hello\"\n---\n",
        )
        .unwrap();
        assert_eq!(format_line(&post), "2024-01-15 - Hello [hello]");

        let undated = Post::from_document("y", "---\ntitle: \"Later\"\n---\n").unwrap();
        assert_eq!(format_line(&undated), "????-??-?? - Later [y]");
    }
}
