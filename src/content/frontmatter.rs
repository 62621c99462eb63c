//! Front-matter parsing and writing
//!
//! Posts start with a small header block:
//!
//! ```text
//! ---
//! title: "Hello"
//! date: "2024-01-15"
//! slug: "hello"
//! ---
//!
//! Body text.
//! ```
//!
//! The parser is line oriented. It reads `key: value` pairs only, so block
//! lists such as the `tags` list written by [`FrontMatter::to_document`] are
//! not read back. Stored posts already rely on this behavior.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::error::{CmsError, Result};
use crate::helpers::parse_date_string;

lazy_static! {
    /// Opening delimiter, non-greedy header, closing delimiter, greedy body
    static ref DOCUMENT_RE: Regex =
        Regex::new(r"(?s)\A---\n(.*?)\n---\n(.*)\z").expect("document pattern");
    static ref FIELD_RE: Regex =
        Regex::new(r"^([A-Za-z0-9_]+):\s*(.+)$").expect("field pattern");
}

/// A scalar value read from a header line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    fn from_raw(raw: &str) -> Self {
        let value = raw.trim();
        let value = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            &value[1..value.len() - 1]
        } else {
            value
        };

        match value {
            "true" => FieldValue::Bool(true),
            "false" => FieldValue::Bool(false),
            _ => FieldValue::Text(value.to_string()),
        }
    }

    fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "\"{}\"", s),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Front-matter data from a post
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub slug: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub draft: bool,

    /// Keys outside the recognized set, in header order. Never written back.
    pub extra: IndexMap<String, FieldValue>,
}

impl FrontMatter {
    /// Parse a stored post into its header and trimmed body
    pub fn parse(raw: &str) -> Result<(Self, &str)> {
        let caps = DOCUMENT_RE
            .captures(raw)
            .ok_or_else(|| CmsError::Format("Invalid post format".to_string()))?;
        let header = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2).map_or("", |m| m.as_str()).trim();

        let mut fm = FrontMatter::default();
        for line in header.lines() {
            let Some(field) = FIELD_RE.captures(line) else {
                continue;
            };
            fm.set(&field[1], FieldValue::from_raw(&field[2]));
        }

        Ok((fm, body))
    }

    fn set(&mut self, key: &str, value: FieldValue) {
        match key {
            "title" => self.title = Some(value.into_text()),
            "date" => self.date = Some(value.into_text()),
            "slug" => self.slug = Some(value.into_text()),
            "summary" => self.summary = Some(value.into_text()),
            // Any non-empty text counts as set, so `draft: yes` stays out of feeds
            "draft" => {
                self.draft = match value {
                    FieldValue::Bool(b) => b,
                    FieldValue::Text(s) => !s.is_empty(),
                }
            }
            // Only an inline scalar reaches this point; block lists are skipped.
            "tags" => {
                let tag = value.into_text();
                self.tags = if tag.is_empty() { Vec::new() } else { vec![tag] };
            }
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    /// Render the canonical header followed by `body`
    pub fn to_document(&self, body: &str) -> String {
        let mut lines = vec![
            format!("title: {}", quoted(self.title.as_deref())),
            format!("date: {}", quoted(self.date.as_deref())),
            format!("slug: {}", quoted(self.slug.as_deref())),
        ];

        if !self.tags.is_empty() {
            lines.push("tags:".to_string());
            lines.extend(self.tags.iter().map(|tag| format!("  - {}", tag)));
        }

        if let Some(summary) = self.summary.as_deref().filter(|s| !s.is_empty()) {
            lines.push(format!("summary: {}", quoted(Some(summary))));
        }

        if self.draft {
            lines.push(format!("draft: {}", FieldValue::Bool(true)));
        }

        format!("---\n{}\n---\n\n{}", lines.join("\n"), body)
    }

    /// Parse the date field, if present and readable
    pub fn parse_date(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(parse_date_string)
    }
}

fn quoted(value: Option<&str>) -> String {
    FieldValue::Text(value.unwrap_or_default().to_string()).to_string()
}
