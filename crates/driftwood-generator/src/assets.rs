//! Static asset handling.
//!
//! Copies the site's static directory and any theme static directory into
//! the output tree, preserving relative paths.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Copies static file trees into the output directory.
#[derive(Debug, Default)]
pub struct AssetCopier {
    sources: Vec<PathBuf>,
}

impl AssetCopier {
    /// Create a new copier with no sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source directory. Missing directories are skipped at copy time.
    #[must_use]
    pub fn with_source(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sources.push(dir.into());
        self
    }

    /// Copy all sources into `output_dir`, returning the number of files
    /// copied. Later sources win on path conflicts, so a theme's static
    /// files can be shadowed by the site's own.
    pub fn copy_to(&self, output_dir: &Path) -> Result<usize> {
        let mut copied = 0;

        for source in &self.sources {
            if !source.is_dir() {
                debug!(dir = %source.display(), "static source missing, skipping");
                continue;
            }

            for entry in walkdir::WalkDir::new(source)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let relative = path
                    .strip_prefix(source)
                    .map_err(|_| AssetError::InvalidPath(path.to_path_buf()))?;
                let dest = output_dir.join(relative);

                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(path, &dest)?;
                copied += 1;
            }

            info!(dir = %source.display(), "copied static files");
        }

        Ok(copied)
    }
}
