//! Plugin hooks for the build pipeline.
//!
//! Plugins observe and mutate the build at three points: before content is
//! collected, after each page's HTML is generated, and after the full site
//! has been written. Hooks run in registration order.

use driftwood_core::{Config, Page};

/// A build pipeline plugin.
///
/// All hooks have default no-op implementations, so a plugin only
/// implements the points it cares about.
pub trait Plugin: Send + Sync {
    /// Plugin name, used in log output.
    fn name(&self) -> &str;

    /// Called once before content collection starts.
    fn pre_build_site(&self, _config: &Config) {}

    /// Called after a page's HTML has been generated, with a chance to
    /// rewrite it.
    fn post_render_page(&self, _page: &Page, html: String) -> String {
        html
    }

    /// Called once after the site has been written to the output directory.
    fn post_build_site(&self, _config: &Config) {}
}

/// Ordered registry of plugins.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. Hooks run in registration order.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        tracing::debug!(plugin = plugin.name(), "registered plugin");
        self.plugins.push(plugin);
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Dispatch the pre-build hook.
    pub fn pre_build_site(&self, config: &Config) {
        for plugin in &self.plugins {
            plugin.pre_build_site(config);
        }
    }

    /// Dispatch the post-render hook, threading the HTML through each plugin.
    pub fn post_render_page(&self, page: &Page, html: String) -> String {
        self.plugins
            .iter()
            .fold(html, |html, plugin| plugin.post_render_page(page, html))
    }

    /// Dispatch the post-build hook.
    pub fn post_build_site(&self, config: &Config) {
        for plugin in &self.plugins {
            plugin.post_build_site(config);
        }
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("PluginRegistry").field("plugins", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        sync::atomic::{AtomicUsize, Ordering},
        sync::Arc,
    };

    use driftwood_core::{ContentPath, Frontmatter};

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

    fn test_page() -> Page {
        let cp = ContentPath::from_path(Path::new("a.md")).unwrap();
        let fm = Frontmatter {
            title: "A".to_string(),
            ..Default::default()
        };
        Page::new(cp, fm, String::new(), String::new())
    }

    struct Counter {
        calls: Arc<AtomicUsize>,
    }

    impl Plugin for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn pre_build_site(&self, _config: &Config) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        fn post_build_site(&self, _config: &Config) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Suffixer(&'static str);

    impl Plugin for Suffixer {
        fn name(&self) -> &str {
            "suffixer"
        }

        fn post_render_page(&self, _page: &Page, html: String) -> String {
            format!("{html}{}", self.0)
        }
    }

    #[test]
    fn test_hooks_dispatch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new();
        registry.register(Box::new(Counter { calls: calls.clone() }));

        let config = test_config();
        registry.pre_build_site(&config);
        registry.post_build_site(&config);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_post_render_runs_in_registration_order() {
        let mut registry = PluginRegistry::new();
        registry.register(Box::new(Suffixer("-a")));
        registry.register(Box::new(Suffixer("-b")));

        let out = registry.post_render_page(&test_page(), "html".to_string());
        assert_eq!(out, "html-a-b");
    }

    #[test]
    fn test_empty_registry_passthrough() {
        let registry = PluginRegistry::new();
        assert!(registry.is_empty());
        let out = registry.post_render_page(&test_page(), "html".to_string());
        assert_eq!(out, "html");
    }
}
