//! Serve command - development server with watch and rebuild

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use color_eyre::eyre::{Result, WrapErr};

use driftwood_core::Config;
use driftwood_generator::Renderer;

use crate::watch::{WatchConfig, WatchSession};

/// CLI overrides for the serve command.
#[derive(Debug, Default)]
pub struct ServeOptions {
    /// Host to bind.
    pub host: Option<String>,
    /// Port to bind.
    pub port: Option<u16>,
    /// Directory to watch instead of the content directory.
    pub watch_dir: Option<PathBuf>,
    /// Output directory to build into and serve.
    pub output: Option<PathBuf>,
    /// Build the site once before watching.
    pub initial_build: bool,
    /// Regexes a changed path must match.
    pub include: Vec<String>,
    /// Regexes that suppress a rebuild.
    pub exclude: Vec<String>,
    /// Open the site in the default browser.
    pub open: bool,
}

/// Run the serve command.
///
/// Builds the site (unless suppressed), then watches the source tree and
/// serves the output directory, rebuilding on every change until
/// interrupted.
pub async fn run(config_path: &Path, options: ServeOptions) -> Result<()> {
    tracing::info!(?config_path, ?options, "Starting development server");

    let mut config =
        Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;

    // Development mode renders drafts.
    config.build.drafts = true;

    if let Some(host) = options.host {
        config.serve.host = host;
    }
    if let Some(port) = options.port {
        config.serve.port = port;
    }
    if let Some(dir) = options.watch_dir {
        config.serve.watch_dir = Some(dir.to_string_lossy().to_string());
    }
    if let Some(output) = options.output {
        config.build.output_dir = output.to_string_lossy().to_string();
    }
    if !options.include.is_empty() {
        config.serve.include = options.include;
    }
    if !options.exclude.is_empty() {
        config.serve.exclude = options.exclude;
    }

    let watch_config = WatchConfig::from_settings(&config)?;

    let builder = super::site_builder(&config);
    let renderer: Arc<dyn Renderer> = Arc::new(builder);

    if options.initial_build {
        println!("  Building site...");
        // A failed initial build is not fatal: keep serving whatever the
        // last successful build left in the output directory.
        match renderer.render() {
            Ok(stats) => {
                println!("  ✓ Built {} pages in {}ms", stats.pages, stats.duration_ms);
            }
            Err(e) => {
                tracing::error!(error = %e, "initial build failed");
                eprintln!("  ✗ Initial build failed: {e}");
                eprintln!("    Serving the previous output, if any.");
            }
        }
    }

    println!();
    println!("  Dev server running at http://{}", watch_config.bind_addr);
    println!("  Watching {} for changes", watch_config.watch_dir.display());
    println!("  Press Ctrl+C to stop");
    println!();

    if options.open {
        let _ = open::that(format!("http://{}", watch_config.bind_addr));
    }

    let session = WatchSession::new(watch_config, renderer);
    session
        .run_until_interrupted()
        .await
        .wrap_err("Development server failed")?;

    println!("  Server stopped.");
    Ok(())
}
