//! RSS feed generation for collections.

use std::path::PathBuf;

use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};
use thiserror::Error;
use tracing::debug;

use driftwood_core::{Config, Page};

/// Feed generation errors.
#[derive(Debug, Error)]
pub enum FeedError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A collection had no pages to put in a feed.
    #[error("empty collection: {0}")]
    EmptyCollection(String),
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Builds one RSS channel per collection.
#[derive(Debug)]
pub struct FeedGenerator {
    config: Config,
}

impl FeedGenerator {
    /// Create a new feed generator.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Generate the RSS XML for a collection.
    pub fn generate(&self, collection: &str, pages: &[&Page]) -> Result<String> {
        if pages.is_empty() {
            return Err(FeedError::EmptyCollection(collection.to_string()));
        }

        debug!(collection, items = pages.len(), "generating feed");

        let base_url = self.config.site.base_url.trim_end_matches('/');
        let items: Vec<_> = pages
            .iter()
            .map(|page| {
                let link = format!("{base_url}{}", page.url);
                ItemBuilder::default()
                    .title(Some(page.title.clone()))
                    .link(Some(link.clone()))
                    .guid(Some(GuidBuilder::default().value(link).permalink(true).build()))
                    .description(page.description.clone())
                    .pub_date(page.date.map(|d| d.to_rfc2822()))
                    .content(Some(page.html.clone()))
                    .build()
            })
            .collect();

        let channel = ChannelBuilder::default()
            .title(format!("{} - {}", self.config.site.title, collection))
            .link(format!("{base_url}/{collection}/"))
            .description(
                self.config
                    .site
                    .description
                    .clone()
                    .unwrap_or_else(|| self.config.site.title.clone()),
            )
            .items(items)
            .build();

        Ok(channel.to_string())
    }

    /// Output path of a collection's feed, relative to the output directory.
    pub fn feed_path(collection: &str) -> PathBuf {
        PathBuf::from(collection).join("rss.xml")
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use driftwood_core::{ContentPath, Frontmatter};

    use super::*;

    fn test_config() -> Config {
        toml::from_str(
            r#"
[site]
title = "Test Site"
base_url = "https://example.com"
description = "A test site"
"#,
        )
        .unwrap()
    }

    fn dated_page(slug: &str, title: &str) -> Page {
        let cp = ContentPath::from_path(Path::new(&format!("{slug}.md"))).unwrap();
        let fm = Frontmatter {
            title: title.to_string(),
            date: Some(chrono::Utc::now()),
            ..Default::default()
        };
        Page::new(cp, fm, String::new(), "<p>hi</p>".to_string())
    }

    #[test]
    fn test_generate_feed() {
        let generator = FeedGenerator::new(test_config());
        let page = dated_page("posts/hello", "Hello");
        let xml = generator.generate("posts", &[&page]).unwrap();

        assert!(xml.contains("<rss"));
        assert!(xml.contains("<title>Test Site - posts</title>"));
        assert!(xml.contains("<link>https://example.com/posts/hello/</link>"));
        assert!(xml.contains("Hello"));
    }

    #[test]
    fn test_empty_collection_rejected() {
        let generator = FeedGenerator::new(test_config());
        assert!(matches!(
            generator.generate("posts", &[]),
            Err(FeedError::EmptyCollection(_))
        ));
    }

    #[test]
    fn test_feed_path() {
        assert_eq!(FeedGenerator::feed_path("posts"), Path::new("posts/rss.xml"));
    }
}
