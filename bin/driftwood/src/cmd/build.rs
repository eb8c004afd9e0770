//! Build command - generates the static site

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};

use driftwood_core::Config;

/// Run the build command.
///
/// Builds the static site from content files to the output directory.
pub fn run(config_path: &Path, output: Option<&Path>, drafts: bool) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, drafts, "Starting build");

    let mut config = Config::load(config_path).wrap_err("Failed to load configuration")?;

    if let Some(output) = output {
        config.build.output_dir = output.to_string_lossy().to_string();
    }
    config.build.drafts = drafts;

    tracing::debug!(?config, "Loaded configuration");

    let builder = super::site_builder(&config);
    let stats = builder.build().wrap_err("Build failed")?;

    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Pages:       {}", stats.pages);
    println!("  Collections: {}", stats.collection_pages);
    println!("  Feeds:       {}", stats.feeds);
    println!("  Assets:      {}", stats.assets);
    println!();
    println!("  Duration:    {:.2}s", duration.as_secs_f64());
    println!("  Output:      {}", config.build.output_dir);
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}
