//! Command implementations.

pub mod build;
pub mod check;
pub mod new;
pub mod serve;

use std::path::Path;

use driftwood_core::Config;
use driftwood_generator::Builder;

/// Construct a site builder from loaded configuration, auto-detecting the
/// static and theme directories.
pub(crate) fn site_builder(config: &Config) -> Builder {
    let mut builder = Builder::new(
        config.clone(),
        &config.build.content_dir,
        &config.build.output_dir,
    );

    let static_dir = Path::new(&config.build.static_dir);
    if static_dir.is_dir() {
        tracing::debug!(dir = %static_dir.display(), "found static directory");
        builder = builder.with_static_dir(static_dir);
    }

    if let Some(theme_dir) = &config.build.theme_dir {
        builder = builder.with_theme_dir(theme_dir);
    }

    builder
}
