//! Content types and structures.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::frontmatter::Frontmatter;

/// Parsed content path with slug and collection extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPath {
    /// Path relative to the content directory.
    pub path: PathBuf,

    /// URL slug derived from the path.
    pub slug: String,

    /// Collection this content belongs to (first path component), if any.
    pub collection: Option<String>,
}

impl ContentPath {
    /// Parse a content-relative path to extract slug and collection.
    ///
    /// Supports patterns like:
    /// - `about.md` → slug: "about", no collection
    /// - `posts/hello.md` → slug: "posts/hello", collection: "posts"
    /// - `posts/hello/index.md` → slug: "posts/hello", collection: "posts"
    ///
    /// Returns `None` for non-Markdown files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if !matches!(extension.to_lowercase().as_str(), "md" | "markdown") {
            return None;
        }

        let stem = path.file_stem()?.to_str()?;
        let parent = path.parent().unwrap_or(Path::new(""));

        let slug = if stem == "index" {
            // For index files, the parent directory is the slug
            parent.to_string_lossy().replace('\\', "/")
        } else if parent.as_os_str().is_empty() {
            stem.to_string()
        } else {
            format!("{}/{stem}", parent.to_string_lossy().replace('\\', "/"))
        };
        let slug = slug.trim_matches('/').to_string();

        let collection = match slug.split_once('/') {
            Some((first, _)) => Some(first.to_string()),
            None => None,
        };

        Some(Self {
            path: path.to_path_buf(),
            slug,
            collection,
        })
    }

    /// Get the URL path for this content.
    pub fn url_path(&self) -> String {
        if self.slug.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", self.slug)
        }
    }
}

/// A fully parsed page, ready for HTML generation.
#[derive(Debug, Clone)]
pub struct Page {
    /// Source file path (relative to the content directory).
    pub source: PathBuf,

    /// URL slug.
    pub slug: String,

    /// URL path ("/posts/hello/").
    pub url: String,

    /// Collection this page belongs to, if any.
    pub collection: Option<String>,

    /// Page title from frontmatter.
    pub title: String,

    /// Publication date.
    pub date: Option<DateTime<Utc>>,

    /// Last updated date.
    pub updated: Option<DateTime<Utc>>,

    /// Whether this page is a draft.
    pub draft: bool,

    /// Description from frontmatter.
    pub description: Option<String>,

    /// Tags from frontmatter.
    pub tags: Vec<String>,

    /// Template override from frontmatter.
    pub template: Option<String>,

    /// Raw body (Markdown source without frontmatter).
    pub body: String,

    /// Rendered HTML body.
    pub html: String,
}

impl Page {
    /// Assemble a page from its parsed parts.
    pub fn new(content_path: ContentPath, frontmatter: Frontmatter, body: String, html: String) -> Self {
        // A frontmatter slug overrides the path-derived one.
        let slug = frontmatter.slug.unwrap_or(content_path.slug);
        let url = if slug.is_empty() {
            "/".to_string()
        } else {
            format!("/{slug}/")
        };

        Self {
            source: content_path.path,
            slug,
            url,
            collection: content_path.collection,
            title: frontmatter.title,
            date: frontmatter.date,
            updated: frontmatter.updated,
            draft: frontmatter.draft,
            description: frontmatter.description,
            tags: frontmatter.tags,
            template: frontmatter.template,
            body,
            html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_page() {
        let cp = ContentPath::from_path(Path::new("about.md")).unwrap();
        assert_eq!(cp.slug, "about");
        assert_eq!(cp.collection, None);
        assert_eq!(cp.url_path(), "/about/");
    }

    #[test]
    fn test_collection_page() {
        let cp = ContentPath::from_path(Path::new("posts/hello.md")).unwrap();
        assert_eq!(cp.slug, "posts/hello");
        assert_eq!(cp.collection.as_deref(), Some("posts"));
    }

    #[test]
    fn test_index_collapsing() {
        let cp = ContentPath::from_path(Path::new("posts/hello/index.md")).unwrap();
        assert_eq!(cp.slug, "posts/hello");
        assert_eq!(cp.collection.as_deref(), Some("posts"));
    }

    #[test]
    fn test_root_index() {
        let cp = ContentPath::from_path(Path::new("index.md")).unwrap();
        assert_eq!(cp.slug, "");
        assert_eq!(cp.url_path(), "/");
    }

    #[test]
    fn test_non_markdown_rejected() {
        assert!(ContentPath::from_path(Path::new("style.css")).is_none());
        assert!(ContentPath::from_path(Path::new("notes.txt")).is_none());
    }

    #[test]
    fn test_frontmatter_slug_override() {
        let cp = ContentPath::from_path(Path::new("posts/hello.md")).unwrap();
        let fm = Frontmatter {
            title: "Hello".to_string(),
            slug: Some("greetings".to_string()),
            ..Default::default()
        };
        let page = Page::new(cp, fm, String::new(), String::new());
        assert_eq!(page.slug, "greetings");
        assert_eq!(page.url, "/greetings/");
    }
}
