//! Site configuration management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration structure for Driftwood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings.
    #[serde(default)]
    pub serve: ServeConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    pub title: String,

    /// Base URL for the site (e.g., "https://example.com").
    pub base_url: String,

    /// Site description for meta tags and feeds.
    #[serde(default)]
    pub description: Option<String>,

    /// Site author name.
    #[serde(default)]
    pub author: Option<String>,

    /// Language code used in the HTML `lang` attribute.
    #[serde(default = "default_language")]
    pub language: String,

    /// Datetime format used when rendering page dates.
    #[serde(default = "default_datetime_format")]
    pub datetime_format: String,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Directory containing content sources.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Output directory for the generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory of static files copied verbatim into the output.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Directory holding theme template overrides and theme static files.
    #[serde(default)]
    pub theme_dir: Option<String>,

    /// Whether to render draft pages.
    #[serde(default)]
    pub drafts: bool,

    /// Whether to generate RSS feeds for collections.
    #[serde(default = "default_true")]
    pub feeds: bool,

    /// Render pages as `slug/index.html` instead of `slug.html`.
    #[serde(default = "default_true")]
    pub clean_urls: bool,
}

/// Development server configuration.
///
/// These fields parameterize the watch-rebuild-serve loop: where to
/// bind, what to watch, how long to let a burst of filesystem events
/// settle, and how long a stopping server may drain connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Host to bind the preview server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the preview server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory to watch for changes. Defaults to the content directory.
    #[serde(default)]
    pub watch_dir: Option<String>,

    /// Debounce interval for filesystem events, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Grace period for draining in-flight requests on stop, in milliseconds.
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,

    /// Regexes a changed path must match to trigger a rebuild (empty = all).
    #[serde(default)]
    pub include: Vec<String>,

    /// Regexes that suppress a rebuild when a changed path matches.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

// Default value functions
fn default_language() -> String {
    "en".to_string()
}

fn default_datetime_format() -> String {
    "%d %b %Y".to_string()
}

fn default_content_dir() -> String {
    "content".to_string()
}

fn default_output_dir() -> String {
    "public".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_grace_ms() -> u64 {
    2000
}

fn default_exclude() -> Vec<String> {
    // Editor temp files and swap files produce event storms on save.
    vec![
        r"~$".to_string(),
        r"\.swp$".to_string(),
        r"\.tmp$".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            output_dir: default_output_dir(),
            static_dir: default_static_dir(),
            theme_dir: None,
            drafts: false,
            feeds: true,
            clean_urls: true,
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            watch_dir: None,
            debounce_ms: default_debounce_ms(),
            grace_ms: default_grace_ms(),
            include: Vec::new(),
            exclude: default_exclude(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate for more flexibility.
    ///
    /// Environment variables prefixed with `DRIFTWOOD` override file
    /// values (e.g. `DRIFTWOOD_SERVE__PORT=9000`).
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("DRIFTWOOD").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.site.title.is_empty() {
            return Err(CoreError::config("site.title cannot be empty"));
        }

        if self.site.base_url.is_empty() {
            return Err(CoreError::config("site.base_url cannot be empty"));
        }

        if self.site.base_url.ends_with('/') {
            tracing::warn!("site.base_url should not have a trailing slash");
        }

        if self.serve.debounce_ms == 0 {
            return Err(CoreError::config("serve.debounce_ms must be non-zero"));
        }

        Ok(())
    }

    /// Directory watched by the development server.
    pub fn watch_dir(&self) -> PathBuf {
        self.serve
            .watch_dir
            .as_deref()
            .unwrap_or(&self.build.content_dir)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MINIMAL: &str = r#"
[site]
title = "Test Site"
base_url = "https://example.com"
"#;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.site.title, "Test Site");
        assert_eq!(config.site.language, "en");
        assert_eq!(config.build.output_dir, "public");
        assert_eq!(config.serve.port, 8000);
        assert_eq!(config.serve.debounce_ms, 300);
        assert!(config.serve.include.is_empty());
        assert!(!config.serve.exclude.is_empty());
    }

    #[test]
    fn test_serve_section_overrides() {
        let toml_str = r#"
[site]
title = "Test Site"
base_url = "https://example.com"

[serve]
host = "0.0.0.0"
port = 4000
debounce_ms = 50
include = ["\\.md$"]
exclude = []
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serve.host, "0.0.0.0");
        assert_eq!(config.serve.port, 4000);
        assert_eq!(config.serve.debounce_ms, 50);
        assert_eq!(config.serve.include, vec!["\\.md$"]);
        assert!(config.serve.exclude.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.site.title, "Test Site");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_empty_title_rejected() {
        let toml_str = r#"
[site]
title = ""
base_url = "https://example.com"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let toml_str = r#"
[site]
title = "Test Site"
base_url = "https://example.com"

[serve]
debounce_ms = 0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_watch_dir_falls_back_to_content_dir() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.watch_dir(), PathBuf::from("content"));

        let toml_str = r#"
[site]
title = "Test Site"
base_url = "https://example.com"

[serve]
watch_dir = "site-src"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.watch_dir(), PathBuf::from("site-src"));
    }
}
