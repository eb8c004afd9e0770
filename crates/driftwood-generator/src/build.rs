//! Build orchestration.
//!
//! Coordinates the full site build process. Rendering happens in a staging
//! directory next to the output directory; the staging tree replaces the
//! output tree only after every step has succeeded, so a failed build
//! leaves the previously published output untouched.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use driftwood_core::Config;

use crate::{
    assets::{AssetCopier, AssetError},
    collector::{CollectorError, ContentCollector},
    feed::{FeedError, FeedGenerator},
    html::{HtmlError, HtmlGenerator},
    plugins::PluginRegistry,
    template::{TemplateError, TemplateRegistry},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Collector error.
    #[error("collector error: {0}")]
    Collector(#[from] CollectorError),

    /// HTML generation error.
    #[error("HTML error: {0}")]
    Html(#[from] HtmlError),

    /// Template loading error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Feed generation error.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of pages generated.
    pub pages: usize,

    /// Number of collection index pages generated.
    pub collection_pages: usize,

    /// Number of feeds generated.
    pub feeds: usize,

    /// Number of static assets copied.
    pub assets: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// A full synchronous site render into the configured output directory.
///
/// This is the seam between the build pipeline and the watch loop: the
/// rebuild coordinator only ever sees this trait. Calling `render`
/// repeatedly with unchanged inputs produces the same output tree.
pub trait Renderer: Send + Sync {
    /// Perform a full site render.
    fn render(&self) -> Result<BuildStats>;
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    content_dir: PathBuf,
    output_dir: PathBuf,
    static_dir: Option<PathBuf>,
    theme_dir: Option<PathBuf>,
    plugins: PluginRegistry,
}

impl Builder {
    /// Create a new builder.
    #[must_use]
    pub fn new(
        config: Config,
        content_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            content_dir: content_dir.into(),
            output_dir: output_dir.into(),
            static_dir: None,
            theme_dir: None,
            plugins: PluginRegistry::new(),
        }
    }

    /// Set the static assets directory.
    #[must_use]
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Set the theme directory (template overrides + theme static files).
    #[must_use]
    pub fn with_theme_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.theme_dir = Some(dir.into());
        self
    }

    /// Set the plugin registry.
    #[must_use]
    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        info!(
            content = %self.content_dir.display(),
            output = %self.output_dir.display(),
            "starting build"
        );

        self.plugins.pre_build_site(&self.config);

        // 1. Prepare a clean staging directory
        let staging = self.staging_dir();
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        // Everything below writes only into staging; the live output tree
        // is replaced in one final step.
        let result = self.build_into(&staging, &mut stats);
        if let Err(e) = result {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        // 2. Swap staging into place
        self.swap_output(&staging)?;

        self.plugins.post_build_site(&self.config);

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = stats.pages,
            collection_pages = stats.collection_pages,
            feeds = stats.feeds,
            assets = stats.assets,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Render the whole site into `staging`.
    fn build_into(&self, staging: &Path, stats: &mut BuildStats) -> Result<()> {
        // Collect content
        let collector = ContentCollector::new(self.config.clone(), &self.content_dir);
        let content = collector.collect()?;

        // Load templates, with theme overrides when present
        let mut templates = TemplateRegistry::new();
        if let Some(theme_dir) = &self.theme_dir {
            templates.load_overrides(&theme_dir.join("templates"))?;
        }
        let generator = HtmlGenerator::with_templates(self.config.clone(), templates);

        // Generate pages in parallel
        let pages: Vec<_> = content.pages.values().collect();
        info!(count = pages.len(), "generating HTML pages");

        pages
            .par_iter()
            .map(|page| {
                let html = generator.generate_page(page)?;
                let html = self.plugins.post_render_page(page, html);
                let output_path = generator.output_path(page, staging);

                if let Some(parent) = output_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&output_path, &html)?;

                debug!(path = %output_path.display(), "wrote page");
                Ok::<_, BuildError>(())
            })
            .collect::<Result<Vec<_>>>()?;
        stats.pages = pages.len();

        // Collection index pages and feeds
        let feed_generator = FeedGenerator::new(self.config.clone());
        for name in content.collections.keys() {
            let collection_pages = content.collection_pages(name);

            let html = generator.generate_collection_index(name, &collection_pages)?;
            let index_path = crate::html::slug_output_path(name, staging, true);
            if let Some(parent) = index_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&index_path, html)?;
            stats.collection_pages += 1;

            if self.config.build.feeds && !collection_pages.is_empty() {
                let xml = feed_generator.generate(name, &collection_pages)?;
                fs::write(staging.join(FeedGenerator::feed_path(name)), xml)?;
                stats.feeds += 1;
            }
        }

        // Static assets: theme static first, site static second so the
        // site's own files win on conflicts.
        let mut copier = AssetCopier::new();
        if let Some(theme_dir) = &self.theme_dir {
            copier = copier.with_source(theme_dir.join("static"));
        }
        if let Some(static_dir) = &self.static_dir {
            copier = copier.with_source(static_dir);
        }
        stats.assets = copier.copy_to(staging)?;

        Ok(())
    }

    /// Replace the output directory with the staging tree.
    ///
    /// The watch loop guarantees no server is reading the output tree
    /// while a build runs, so removing and renaming here cannot race a
    /// reader.
    fn swap_output(&self, staging: &Path) -> Result<()> {
        if self.output_dir.exists() {
            fs::remove_dir_all(&self.output_dir)?;
        }
        if let Some(parent) = self.output_dir.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::rename(staging, &self.output_dir)?;
        debug!(dir = %self.output_dir.display(), "published output");
        Ok(())
    }

    /// Staging directory used while a build is in flight.
    fn staging_dir(&self) -> PathBuf {
        let mut name = self
            .output_dir
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "public".into());
        name.push(".staging");
        self.output_dir.with_file_name(name)
    }
}

impl Renderer for Builder {
    fn render(&self) -> Result<BuildStats> {
        self.build()
    }
}
