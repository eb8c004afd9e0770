//! HTML template system for page generation.
//!
//! Provides a lightweight template system using string interpolation rather
//! than heavy template engines like Tera or Handlebars. A theme directory
//! may override any built-in template by shipping a file of the same name
//! under `templates/`.

use std::{collections::HashMap, fs, path::Path};

use thiserror::Error;
use tracing::debug;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),

    /// IO error while loading templates from disk.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template context with variables for interpolation.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Create context with initial variables.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a variable value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Check if a variable exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }
}

/// A simple template that supports variable interpolation.
///
/// Variables are specified as `{{ variable_name }}` in the template string.
/// `{{ variable? }}` marks a variable as optional; it renders as the empty
/// string when absent from the context.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    /// Create a new template with the given name and content.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Get the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template with the given context.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut result = self.content.clone();
        let mut pos = 0;

        while let Some(start) = result[pos..].find("{{") {
            let start = pos + start;
            let end = result[start..]
                .find("}}")
                .ok_or_else(|| TemplateError::InvalidSyntax("unclosed {{ delimiter".to_string()))?;
            let end = start + end + 2;

            let var_name = result[start + 2..end - 2].trim();

            let (var_name, optional) = if let Some(stripped) = var_name.strip_suffix('?') {
                (stripped, true)
            } else {
                (var_name, false)
            };

            let value = match context.get(var_name) {
                Some(v) => v.to_string(),
                None if optional => String::new(),
                None => return Err(TemplateError::MissingVariable(var_name.to_string())),
            };

            result.replace_range(start..end, &value);
            pos = start + value.len();
        }

        Ok(result)
    }
}

/// Registry of templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Create a new registry with default templates.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    /// Register default built-in templates.
    fn register_defaults(&mut self) {
        self.register(Template::new("base", DEFAULT_BASE_TEMPLATE));
        self.register(Template::new("page", DEFAULT_PAGE_TEMPLATE));
        self.register(Template::new("list", DEFAULT_LIST_TEMPLATE));
    }

    /// Register a template.
    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Load template overrides from a theme's `templates/` directory.
    ///
    /// Each `*.html` file registers under its stem, shadowing any built-in
    /// of the same name.
    pub fn load_overrides(&mut self, templates_dir: &Path) -> Result<usize> {
        if !templates_dir.is_dir() {
            return Ok(0);
        }

        let mut loaded = 0;
        for entry in fs::read_dir(templates_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "html") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path)?;
            debug!(name = stem, path = %path.display(), "loaded template override");
            self.register(Template::new(stem, content));
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Get a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        template.render(context)
    }
}

/// Default base HTML template.
pub const DEFAULT_BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}{{ site_title_suffix? }}</title>
    <meta name="description" content="{{ description? }}">
    <meta name="author" content="{{ author? }}">
    <link rel="canonical" href="{{ canonical_url }}">
    <style>
        body {
            font-family: system-ui, -apple-system, sans-serif;
            line-height: 1.7;
            max-width: 46rem;
            margin: 0 auto;
            padding: 2rem 1rem;
            color: #1e293b;
        }
        a { color: #2563eb; }
        pre {
            background: #f1f5f9;
            padding: 1rem;
            overflow-x: auto;
        }
        header nav a { margin-right: 1rem; }
        footer {
            margin-top: 3rem;
            border-top: 1px solid #e2e8f0;
            padding-top: 1rem;
            font-size: 0.875rem;
            color: #64748b;
        }
    </style>
</head>
<body>
    <header>
        <nav><a href="/">{{ site_title }}</a></nav>
    </header>
    <main>
{{ content }}
    </main>
    <footer>&copy; {{ year }} {{ site_title }}</footer>
</body>
</html>
"#;

/// Default single-page template.
pub const DEFAULT_PAGE_TEMPLATE: &str = r#"<article>
    <h1>{{ title }}</h1>
    {{ date_html? }}
    {{ body }}
</article>
"#;

/// Default collection index template.
pub const DEFAULT_LIST_TEMPLATE: &str = r#"<section>
    <h1>{{ title }}</h1>
    <ul class="collection-list">
{{ items }}
    </ul>
</section>
"#;
