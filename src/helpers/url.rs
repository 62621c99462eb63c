//! URL helper functions

use crate::config::SiteConfig;

/// The site root without a trailing slash
///
/// # Examples
/// ```ignore
/// site_url(&config) // -> "https://example.com"
/// ```
pub fn site_url(config: &SiteConfig) -> &str {
    config.url.trim_end_matches('/')
}

/// Public URL of a post
///
/// # Examples
/// ```ignore
/// post_url(&config, "hello-world") // -> "https://example.com/hello-world"
/// ```
pub fn post_url(config: &SiteConfig, slug: &str) -> String {
    format!("{}/{}", site_url(config), slug.trim_start_matches('/'))
}
