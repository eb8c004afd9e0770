//! Content collection and organization.
//!
//! Walks the content directory and collects all pages into a structured
//! hierarchy of top-level pages and collections.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use pulldown_cmark::{html, Options, Parser};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use driftwood_core::{frontmatter::parse_frontmatter, Config, ContentPath, Page};

/// Content collection errors.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parser error.
    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The content directory does not exist.
    #[error("content directory not found: {0}")]
    MissingContentDir(PathBuf),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Collected site content.
#[derive(Debug, Default)]
pub struct SiteContent {
    /// All pages indexed by slug.
    pub pages: HashMap<String, Page>,

    /// Collection name to page slugs, each sorted by date descending.
    pub collections: HashMap<String, Vec<String>>,
}

impl SiteContent {
    /// Pages of a collection in their sorted order.
    pub fn collection_pages(&self, name: &str) -> Vec<&Page> {
        self.collections
            .get(name)
            .map(|slugs| slugs.iter().filter_map(|s| self.pages.get(s)).collect())
            .unwrap_or_default()
    }
}

/// Content collector that walks directories and parses files.
#[derive(Debug)]
pub struct ContentCollector {
    config: Config,
    content_dir: PathBuf,
}

impl ContentCollector {
    /// Create a new content collector.
    #[must_use]
    pub fn new(config: Config, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            content_dir: content_dir.into(),
        }
    }

    /// Collect all content from the content directory.
    pub fn collect(&self) -> Result<SiteContent> {
        if !self.content_dir.is_dir() {
            return Err(CollectorError::MissingContentDir(self.content_dir.clone()));
        }

        info!(dir = %self.content_dir.display(), "collecting content");

        let files = self.find_content_files()?;
        info!(count = files.len(), "found content files");

        // Parse files in parallel; a broken file is skipped with a warning
        // instead of failing the whole build.
        let pages: Vec<_> = files
            .par_iter()
            .filter_map(|path| match self.parse_file(path) {
                Ok(page) => {
                    if page.draft && !self.config.build.drafts {
                        debug!(url = %page.url, "skipping draft");
                        None
                    } else {
                        Some(page)
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse file");
                    None
                }
            })
            .collect();

        let mut content = SiteContent::default();

        for page in pages {
            if let Some(collection) = page.collection.clone() {
                content
                    .collections
                    .entry(collection)
                    .or_default()
                    .push(page.slug.clone());
            }
            content.pages.insert(page.slug.clone(), page);
        }

        // Sort each collection by date descending, undated entries last.
        for slugs in content.collections.values_mut() {
            slugs.sort_by(|a, b| {
                let da = content.pages.get(a).and_then(|p| p.date);
                let db = content.pages.get(b).and_then(|p| p.date);
                db.cmp(&da).then_with(|| a.cmp(b))
            });
        }

        Ok(content)
    }

    /// Find all Markdown files under the content directory.
    fn find_content_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in walkdir::WalkDir::new(&self.content_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_lowercase().as_str(), "md" | "markdown"))
            {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Parse a single content file into a page.
    fn parse_file(&self, path: &Path) -> Result<Page> {
        let relative = path.strip_prefix(&self.content_dir).unwrap_or(path);

        let content_path =
            ContentPath::from_path(relative).ok_or_else(|| CollectorError::Parse {
                path: path.to_path_buf(),
                message: "not a content file".to_string(),
            })?;

        let raw = fs::read_to_string(path)?;
        let (frontmatter, body) =
            parse_frontmatter(&raw, path).map_err(|e| CollectorError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let html = render_markdown(&body);
        Ok(Page::new(content_path, frontmatter, body, html))
    }
}

/// Render Markdown source to HTML.
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn test_config() -> Config {
        toml::from_str(
            r#"
[site]
title = "Test Site"
base_url = "https://example.com"
"#,
        )
        .unwrap()
    }

    fn write_page(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collect_pages_and_collections() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "about.md", "---\ntitle: About\n---\nHello");
        write_page(
            dir.path(),
            "posts/first.md",
            "---\ntitle: First\ndate: 2024-01-01T00:00:00Z\n---\nOne",
        );
        write_page(
            dir.path(),
            "posts/second.md",
            "---\ntitle: Second\ndate: 2024-02-01T00:00:00Z\n---\nTwo",
        );

        let collector = ContentCollector::new(test_config(), dir.path());
        let content = collector.collect().unwrap();

        assert_eq!(content.pages.len(), 3);
        assert!(content.pages.contains_key("about"));

        let posts = content.collection_pages("posts");
        assert_eq!(posts.len(), 2);
        // Newest first
        assert_eq!(posts[0].title, "Second");
        assert_eq!(posts[1].title, "First");
    }

    #[test]
    fn test_drafts_skipped_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write_page(
            dir.path(),
            "wip.md",
            "---\ntitle: WIP\ndraft: true\n---\nSoon",
        );

        let collector = ContentCollector::new(test_config(), dir.path());
        let content = collector.collect().unwrap();
        assert!(content.pages.is_empty());

        let mut config = test_config();
        config.build.drafts = true;
        let collector = ContentCollector::new(config, dir.path());
        let content = collector.collect().unwrap();
        assert_eq!(content.pages.len(), 1);
    }

    #[test]
    fn test_broken_file_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "good.md", "---\ntitle: Good\n---\nOk");
        write_page(dir.path(), "bad.md", "---\ntitle: [unclosed\n---\nNope");

        let collector = ContentCollector::new(test_config(), dir.path());
        let content = collector.collect().unwrap();
        assert_eq!(content.pages.len(), 1);
        assert!(content.pages.contains_key("good"));
    }

    #[test]
    fn test_missing_content_dir() {
        let collector = ContentCollector::new(test_config(), "does/not/exist");
        assert!(matches!(
            collector.collect(),
            Err(CollectorError::MissingContentDir(_))
        ));
    }

    #[test]
    fn test_render_markdown() {
        let html = render_markdown("# Title\n\nSome *emphasis*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
    }
}
