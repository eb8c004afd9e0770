//! New command - create new content from template

use std::{fs, path::Path};

use chrono::Utc;
use color_eyre::eyre::{Result, WrapErr};

use driftwood_core::Config;

/// Run the new command.
///
/// Creates a new content file with boilerplate frontmatter.
pub fn run(config_path: &Path, path: &Path, template: &str) -> Result<()> {
    tracing::info!(?path, template, "Creating new content");

    let content_dir = Config::load(config_path)
        .map(|c| c.build.content_dir)
        .unwrap_or_else(|_| "content".to_string());
    let full_path = Path::new(&content_dir).join(path);

    let file_path = if full_path.extension().is_some() {
        full_path
    } else {
        full_path.with_extension("md")
    };

    let frontmatter = match template {
        "page" => page_frontmatter(path),
        _ => post_frontmatter(path),
    };

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).wrap_err("Failed to create directories")?;
    }

    fs::write(&file_path, frontmatter).wrap_err("Failed to write file")?;

    tracing::info!(?file_path, "Created new content file");
    println!("Created: {}", file_path.display());

    Ok(())
}

fn title_from(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled")
        .replace('-', " ")
}

fn post_frontmatter(path: &Path) -> String {
    let title = title_from(path);
    let date = Utc::now().to_rfc3339();

    format!(
        r#"---
title: "{title}"
date: {date}
draft: true
tags: []
---

Write your content here.
"#
    )
}

fn page_frontmatter(path: &Path) -> String {
    let title = title_from(path);

    format!(
        r#"---
title: "{title}"
---

Write your content here.
"#
    )
}
