//! Content module - post models, front-matter codec and local loading

mod frontmatter;
pub mod loader;
mod post;

pub use frontmatter::{FieldValue, FrontMatter};
pub use post::{is_valid_slug, sort_newest_first, Post, PostInput, PostSummary};
