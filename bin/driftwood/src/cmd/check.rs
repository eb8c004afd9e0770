//! Check command - validate configuration and content

use std::path::Path;

use color_eyre::eyre::{bail, Result};

use driftwood_core::{frontmatter::parse_frontmatter, Config};

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates configuration and all content files.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and content");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let config = match Config::load(config_path) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            Some(c)
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e}"));
            println!("  ✗ Configuration invalid: {e}");
            None
        }
    };

    if let Some(config) = &config {
        let content_dir = Path::new(&config.build.content_dir);
        if content_dir.is_dir() {
            println!();
            println!("Checking content files...");
            validate_content(content_dir, &mut result);
        } else {
            result.add_warning(format!(
                "content directory not found: {}",
                content_dir.display()
            ));
        }
    }

    println!();
    if result.has_errors() {
        for error in &result.errors {
            println!("  error: {error}");
        }
        bail!("check failed with {} error(s)", result.errors.len());
    }

    if result.has_warnings() {
        for warning in &result.warnings {
            println!("  warning: {warning}");
        }
        if strict {
            bail!("check failed with {} warning(s) (strict)", result.warnings.len());
        }
    }

    println!("All checks passed.");
    Ok(())
}

/// Parse every content file, recording errors and missing titles.
fn validate_content(content_dir: &Path, result: &mut ValidationResult) {
    let mut checked = 0usize;

    for path in content_files(content_dir) {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                result.add_error(format!("{}: {e}", path.display()));
                continue;
            }
        };

        match parse_frontmatter(&raw, &path) {
            Ok((frontmatter, _body)) => {
                if frontmatter.title.is_empty() {
                    result.add_warning(format!("{}: missing title", path.display()));
                }
            }
            Err(e) => result.add_error(e.to_string()),
        }
        checked += 1;
    }

    println!("  ✓ Checked {checked} content file(s)");
}

fn content_files(dir: &Path) -> Vec<std::path::PathBuf> {
    walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_lowercase().as_str(), "md" | "markdown"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_validation_result() {
        let mut result = ValidationResult::default();
        assert!(!result.has_errors());
        assert!(!result.has_warnings());

        result.add_warning("w");
        result.add_error("e");
        assert!(result.has_errors());
        assert!(result.has_warnings());
    }

    #[test]
    fn test_validate_content_flags_missing_title() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ok.md"), "---\ntitle: Ok\n---\nBody").unwrap();
        fs::write(dir.path().join("untitled.md"), "No frontmatter at all").unwrap();

        let mut result = ValidationResult::default();
        validate_content(dir.path(), &mut result);

        assert!(!result.has_errors());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("untitled.md"));
    }

    #[test]
    fn test_validate_content_flags_broken_frontmatter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.md"), "---\ntitle: [unclosed\n---\nBody").unwrap();

        let mut result = ValidationResult::default();
        validate_content(dir.path(), &mut result);
        assert!(result.has_errors());
    }
}
