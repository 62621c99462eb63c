//! Generator module - writes the RSS feed and sitemap for published posts

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;

use crate::content::{sort_newest_first, Post};
use crate::helpers::{date_iso8601, date_rfc2822, post_url, site_url};
use crate::Site;

/// Number of posts included in the RSS feed
pub const FEED_LIMIT: usize = 20;

pub const RSS_FILE: &str = "rss.xml";
pub const SITEMAP_FILE: &str = "sitemap.xml";

/// Feed and sitemap generator
pub struct Generator {
    site: Site,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Self {
        Self { site: site.clone() }
    }

    /// Write `rss.xml` and `sitemap.xml`, replacing previous output
    pub fn generate(&self, posts: &[Post]) -> Result<()> {
        fs::create_dir_all(&self.site.public_dir)
            .with_context(|| format!("Failed to create {:?}", self.site.public_dir))?;

        // Sort posts by date (newest first)
        let mut sorted_posts = posts.to_vec();
        sort_newest_first(&mut sorted_posts);

        let now = Utc::now();

        let rss_path = self.site.public_dir.join(RSS_FILE);
        fs::write(&rss_path, self.render_rss(&sorted_posts, now))
            .with_context(|| format!("Failed to write {:?}", rss_path))?;
        tracing::info!("Generated {}", RSS_FILE);

        let sitemap_path = self.site.public_dir.join(SITEMAP_FILE);
        fs::write(&sitemap_path, self.render_sitemap(&sorted_posts, now))
            .with_context(|| format!("Failed to write {:?}", sitemap_path))?;
        tracing::info!("Generated {}", SITEMAP_FILE);

        Ok(())
    }

    /// Render an RSS 2.0 document from posts already sorted newest first
    pub fn render_rss(&self, posts: &[Post], now: DateTime<Utc>) -> String {
        let config = &self.site.config;
        let base_url = escape_xml(site_url(config));

        let mut rss = String::new();
        rss.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        rss.push('\n');
        rss.push_str(r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">"#);
        rss.push('\n');
        rss.push_str("  <channel>\n");
        rss.push_str(&format!("    <title>{}</title>\n", escape_xml(&config.title)));
        rss.push_str(&format!("    <link>{}</link>\n", base_url));
        rss.push_str(&format!(
            "    <description>{}</description>\n",
            escape_xml(&config.description)
        ));
        rss.push_str(&format!(
            "    <language>{}</language>\n",
            escape_xml(&config.language)
        ));
        rss.push_str(&format!(
            "    <lastBuildDate>{}</lastBuildDate>\n",
            date_rfc2822(&now)
        ));
        rss.push_str(&format!(
            "    <atom:link href=\"{}/{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
            base_url, RSS_FILE
        ));

        for post in posts.iter().take(FEED_LIMIT) {
            let link = escape_xml(&post_url(config, &post.slug));
            rss.push_str("    <item>\n");
            rss.push_str(&format!("      <title>{}</title>\n", escape_xml(&post.title)));
            rss.push_str(&format!("      <link>{}</link>\n", link));
            rss.push_str(&format!(
                "      <description>{}</description>\n",
                escape_xml(post.description())
            ));
            if let Some(date) = post.published_at() {
                rss.push_str(&format!("      <pubDate>{}</pubDate>\n", date_rfc2822(&date)));
            }
            rss.push_str(&format!("      <guid>{}</guid>\n", link));
            rss.push_str("    </item>\n");
        }

        rss.push_str("  </channel>\n");
        rss.push_str("</rss>\n");
        rss
    }

    /// Render a sitemap with the site root and every post
    pub fn render_sitemap(&self, posts: &[Post], now: DateTime<Utc>) -> String {
        let config = &self.site.config;

        let mut sitemap = String::new();
        sitemap.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        sitemap.push('\n');
        sitemap.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        sitemap.push('\n');
        push_url(
            &mut sitemap,
            site_url(config),
            Some(now),
            "daily",
            "1.0",
        );

        for post in posts {
            push_url(
                &mut sitemap,
                &post_url(config, &post.slug),
                post.published_at(),
                "weekly",
                "0.8",
            );
        }

        sitemap.push_str("</urlset>\n");
        sitemap
    }
}

fn push_url(
    out: &mut String,
    loc: &str,
    lastmod: Option<DateTime<Utc>>,
    changefreq: &str,
    priority: &str,
) {
    out.push_str("  <url>\n");
    out.push_str(&format!("    <loc>{}</loc>\n", escape_xml(loc)));
    if let Some(date) = lastmod {
        out.push_str(&format!("    <lastmod>{}</lastmod>\n", date_iso8601(&date)));
    }
    out.push_str(&format!("    <changefreq>{}</changefreq>\n", changefreq));
    out.push_str(&format!("    <priority>{}</priority>\n", priority));
    out.push_str("  </url>\n");
}

/// Escape XML special characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
