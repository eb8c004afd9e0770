//! HTML generation from parsed content.
//!
//! Converts parsed pages into final HTML documents using templates.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use thiserror::Error;
use tracing::debug;

use driftwood_core::{Config, Page};

use crate::template::{Template, TemplateContext, TemplateError, TemplateRegistry};

/// HTML generation errors.
#[derive(Debug, Error)]
pub enum HtmlError {
    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for HTML generation.
pub type Result<T> = std::result::Result<T, HtmlError>;

/// HTML page generator.
#[derive(Debug)]
pub struct HtmlGenerator {
    templates: TemplateRegistry,
    config: Config,
}

impl HtmlGenerator {
    /// Create a new HTML generator with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            templates: TemplateRegistry::new(),
            config,
        }
    }

    /// Create a generator with custom templates.
    #[must_use]
    pub fn with_templates(config: Config, templates: TemplateRegistry) -> Self {
        Self { templates, config }
    }

    /// Register a custom template.
    pub fn register_template(&mut self, template: Template) {
        self.templates.register(template);
    }

    /// Generate the full HTML document for a page.
    pub fn generate_page(&self, page: &Page) -> Result<String> {
        debug!(url = %page.url, "generating HTML for page");

        let template_name = page.template.as_deref().unwrap_or("page");

        let mut inner_ctx = TemplateContext::new()
            .with_var("title", &page.title)
            .with_var("body", &page.html);
        if let Some(date) = page.date {
            inner_ctx.insert(
                "date_html",
                format!(
                    r#"<p class="page-date">{}</p>"#,
                    date.format(&self.config.site.datetime_format)
                ),
            );
        }
        let inner_html = self.templates.render(template_name, &inner_ctx)?;

        let base_ctx = self.base_context(&page.title, &page.url, &inner_html);
        let base_ctx = match &page.description {
            Some(desc) => base_ctx.with_var("description", desc),
            None => base_ctx,
        };
        Ok(self.templates.render("base", &base_ctx)?)
    }

    /// Generate the index page for a collection.
    pub fn generate_collection_index(&self, name: &str, pages: &[&Page]) -> Result<String> {
        let title = capitalize(name);
        let mut items = String::new();
        for page in pages {
            let date = page
                .date
                .map(|d| format!(" <small>{}</small>", d.format(&self.config.site.datetime_format)))
                .unwrap_or_default();
            items.push_str(&format!(
                "        <li><a href=\"{}\">{}</a>{date}</li>\n",
                page.url, page.title
            ));
        }

        let inner_ctx = TemplateContext::new()
            .with_var("title", &title)
            .with_var("items", items.trim_end_matches('\n'));
        let inner_html = self.templates.render("list", &inner_ctx)?;

        let url = format!("/{name}/");
        let base_ctx = self.base_context(&title, &url, &inner_html);
        Ok(self.templates.render("base", &base_ctx)?)
    }

    /// Compute the output path for a page.
    pub fn output_path(&self, page: &Page, output_dir: &Path) -> PathBuf {
        slug_output_path(&page.slug, output_dir, self.config.build.clean_urls)
    }

    fn base_context(&self, title: &str, url: &str, content: &str) -> TemplateContext {
        let mut ctx = TemplateContext::new()
            .with_var("lang", &self.config.site.language)
            .with_var("title", title)
            .with_var("site_title", &self.config.site.title)
            .with_var("site_title_suffix", format!(" | {}", self.config.site.title))
            .with_var(
                "canonical_url",
                format!("{}{url}", self.config.site.base_url),
            )
            .with_var("content", content)
            .with_var("year", Utc::now().year().to_string());
        if let Some(author) = &self.config.site.author {
            ctx.insert("author", author);
        }
        ctx
    }
}

/// Compute the output path for a slug.
pub fn slug_output_path(slug: &str, output_dir: &Path, clean_urls: bool) -> PathBuf {
    if slug.is_empty() {
        output_dir.join("index.html")
    } else if clean_urls {
        output_dir.join(slug).join("index.html")
    } else {
        output_dir.join(format!("{slug}.html"))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
