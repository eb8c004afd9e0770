//! The watch-rebuild-serve loop.
//!
//! Development mode binds three pieces together: a [`ChangeObserver`]
//! watching the source tree, a preview server serving the output tree, and
//! a [`RebuildCoordinator`] that owns the server's lifecycle and performs a
//! stop → rebuild → restart cycle for every debounced change. The
//! [`WatchSession`] drives startup ordering and ordered teardown.

pub mod coordinator;
pub mod observer;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

use std::{path::PathBuf, time::Duration};

use regex::Regex;
use thiserror::Error;

use driftwood_core::Config;

use crate::server::ServerError;

pub use coordinator::{RebuildCoordinator, RebuildState};
pub use observer::{ChangeEvent, ChangeKind, ChangeObserver};
pub use session::WatchSession;

/// Errors that abort a watch session before it enters the watch loop.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The preview server could not bind its address.
    #[error(transparent)]
    Bind(#[from] ServerError),

    /// The directory to watch does not exist or is not a directory.
    #[error("watch directory not found: {0}")]
    WatchSetup(PathBuf),

    /// An include/exclude pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The OS-level file watcher could not be set up.
    #[error("failed to set up file watcher: {0}")]
    Watcher(#[from] notify::Error),
}

/// Immutable settings for one watch session.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Directory tree watched for changes.
    pub watch_dir: PathBuf,

    /// Directory served by the preview server.
    pub output_dir: PathBuf,

    /// Address the preview server binds, as `host:port`.
    pub bind_addr: String,

    /// A changed path must match at least one of these to trigger a
    /// rebuild. Empty means every path qualifies.
    pub include: Vec<Regex>,

    /// A changed path matching any of these never triggers a rebuild.
    pub exclude: Vec<Regex>,

    /// Quiet interval after which a burst of events becomes one trigger.
    pub debounce: Duration,

    /// Bounded wait for in-flight requests when stopping the server.
    pub grace: Duration,
}

impl WatchConfig {
    /// Build a watch configuration from loaded site settings.
    pub fn from_settings(config: &Config) -> Result<Self, ServeError> {
        Ok(Self {
            watch_dir: config.watch_dir(),
            output_dir: PathBuf::from(&config.build.output_dir),
            bind_addr: format!("{}:{}", config.serve.host, config.serve.port),
            include: compile_patterns(&config.serve.include)?,
            exclude: compile_patterns(&config.serve.exclude)?,
            debounce: Duration::from_millis(config.serve.debounce_ms),
            grace: Duration::from_millis(config.serve.grace_ms),
        })
    }
}

/// Compile a list of pattern strings, reporting the first bad one.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ServeError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ServeError::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_patterns() {
        let patterns = vec![r"\.md$".to_string(), r"~$".to_string()];
        let compiled = compile_patterns(&patterns).unwrap();
        assert_eq!(compiled.len(), 2);
        assert!(compiled[0].is_match("posts/hello.md"));
    }

    #[test]
    fn test_bad_pattern_reports_source() {
        let patterns = vec![r"[unclosed".to_string()];
        let err = compile_patterns(&patterns).unwrap_err();
        assert!(matches!(err, ServeError::Pattern { pattern, .. } if pattern == "[unclosed"));
    }

    #[test]
    fn test_watch_config_from_settings() {
        let config: Config = toml::from_str(
            r#"
[site]
title = "Test Site"
base_url = "https://example.com"

[serve]
host = "127.0.0.1"
port = 4321
debounce_ms = 150
"#,
        )
        .unwrap();

        let watch_config = WatchConfig::from_settings(&config).unwrap();
        assert_eq!(watch_config.bind_addr, "127.0.0.1:4321");
        assert_eq!(watch_config.watch_dir, PathBuf::from("content"));
        assert_eq!(watch_config.output_dir, PathBuf::from("public"));
        assert_eq!(watch_config.debounce, Duration::from_millis(150));
        // Default excludes cover editor temp files
        assert!(watch_config.exclude.iter().any(|re| re.is_match("draft.swp")));
    }
}
