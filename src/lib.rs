//! blog-cms: a headless CMS for a Markdown blog kept in a GitHub repository
//!
//! The HTTP API edits posts through GitHub's contents API, and the build
//! commands regenerate the RSS feed and sitemap from the local working tree.
//! Both sides share the same front-matter codec.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod repository;
pub mod server;
pub mod store;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use error::CmsError;

/// A blog working tree
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding `{slug}.md` files
    pub posts_dir: PathBuf,
    /// Build output directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Open a site from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let posts_dir = base_dir.join(&config.posts_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            posts_dir,
            public_dir,
        })
    }

    /// Regenerate the RSS feed and sitemap
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }
}
