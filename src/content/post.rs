//! Post models

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::frontmatter::{FieldValue, FrontMatter};
use crate::error::{CmsError, Result};

lazy_static! {
    static ref SLUG_RE: Regex = Regex::new(r"^[a-z0-9-]+$").expect("slug pattern");
}

/// Whether `slug` is made of lowercase letters, digits and hyphens only
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// A blog post with its body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Slug (URL-friendly name)
    pub slug: String,

    /// Post title
    pub title: String,

    /// Publication date as written in the header
    pub date: String,

    /// Post tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Short description for listings and feeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Drafts are kept out of feeds
    pub draft: bool,

    /// Raw markdown content
    pub content: String,

    /// Unrecognized header fields
    #[serde(flatten)]
    pub extra: IndexMap<String, FieldValue>,
}

impl Post {
    /// Build a post from a stored document.
    ///
    /// `fallback_slug` is used when the header carries no slug.
    pub fn from_document(fallback_slug: &str, raw: &str) -> Result<Self> {
        let (fm, body) = FrontMatter::parse(raw)?;
        let mut extra = fm.extra;
        // The body always owns the `content` key
        extra.shift_remove("content");

        Ok(Self {
            slug: fm.slug.unwrap_or_else(|| fallback_slug.to_string()),
            title: fm.title.unwrap_or_default(),
            date: fm.date.unwrap_or_default(),
            tags: fm.tags,
            summary: fm.summary,
            draft: fm.draft,
            content: body.to_string(),
            extra,
        })
    }

    /// Parsed publication date
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        crate::helpers::parse_date_string(&self.date)
    }

    /// Text used for feed descriptions
    pub fn description(&self) -> &str {
        self.summary
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.title)
    }
}

/// Sort posts newest first. Posts with unreadable dates go last, in their
/// original relative order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
}

/// One entry of the post listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
    pub summary: String,
    pub draft: bool,
}

impl PostSummary {
    /// Summarize a header, filling gaps from the file name
    pub fn from_front_matter(fm: FrontMatter, file_name: &str) -> Self {
        Self {
            slug: fm
                .slug
                .unwrap_or_else(|| file_name.trim_end_matches(".md").to_string()),
            title: fm.title.unwrap_or_else(|| "Untitled".to_string()),
            date: fm.date.unwrap_or_default(),
            tags: fm.tags,
            summary: fm.summary.unwrap_or_default(),
            draft: fm.draft,
        }
    }
}

/// Payload of a save request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostInput {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub draft: Option<bool>,
    pub content: String,

    /// Slug of the post being edited; absent when creating
    pub existing_slug: Option<String>,
}

impl PostInput {
    /// Check the fields that must hold before anything is written
    pub fn validate(&self) -> Result<()> {
        if !is_valid_slug(&self.slug) {
            return Err(CmsError::validation("Invalid slug format"));
        }
        if self.title.trim().is_empty() {
            return Err(CmsError::validation("Title required"));
        }
        Ok(())
    }

    /// Render the stored file for this post
    pub fn to_document(&self) -> String {
        let fm = FrontMatter {
            title: Some(self.title.clone()),
            date: Some(self.date.clone()),
            slug: Some(self.slug.clone()),
            tags: self.tags.clone().unwrap_or_default(),
            summary: self.summary.clone(),
            draft: self.draft.unwrap_or(false),
            extra: IndexMap::new(),
        };
        fm.to_document(&self.content)
    }
}
