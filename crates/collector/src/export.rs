//! Persists consolidated issues as JSON.
//!
//! Output layout: `{output}/doc-issues/doc-issues.json`, one JSON object
//! keyed by canonical issue key.

use std::fs;
use std::path::{Path, PathBuf};

use issues::{CollectorError, ConsolidatedIssues, IssueCatalog};
use tracing::{debug, info};

/// Sub-directory of the output path owned by the `doc-issues` mode.
pub const DOC_ISSUES_DIR: &str = "doc-issues";
/// File name of the exported catalog.
pub const DOC_ISSUES_FILE: &str = "doc-issues.json";

/// Removes the output of a previous run and recreates an empty directory.
pub fn clean_output_directory(dir: &Path) -> Result<(), CollectorError> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|source| export_error(dir, source))?;
    }
    fs::create_dir_all(dir).map_err(|source| export_error(dir, source))?;
    debug!(path = %dir.display(), "'doc-issues' mode output directory cleaned.");
    Ok(())
}

/// Converts the consolidated issues to their persisted shape.
pub fn to_catalog(consolidated: &ConsolidatedIssues) -> IssueCatalog {
    let mut catalog = IssueCatalog::new();
    for (key, issue) in consolidated {
        catalog.add_issue(key.as_str(), issue.to_persisted());
    }
    catalog
}

/// Writes `consolidated` to `dir/doc-issues.json` and returns the file path.
pub fn export_consolidated(
    consolidated: &ConsolidatedIssues,
    dir: &Path,
) -> Result<PathBuf, CollectorError> {
    let path = dir.join(DOC_ISSUES_FILE);
    info!(path = %path.display(), "Exporting consolidated issues - exporting to file.");
    save_catalog(&to_catalog(consolidated), &path)?;
    Ok(path)
}

pub fn save_catalog(catalog: &IssueCatalog, path: &Path) -> Result<(), CollectorError> {
    let json = serde_json::to_string_pretty(catalog).map_err(|source| CollectorError::Encoding {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, json).map_err(|source| export_error(path, source))
}

pub fn load_catalog(path: &Path) -> Result<IssueCatalog, CollectorError> {
    let json = fs::read_to_string(path).map_err(|source| export_error(path, source))?;
    serde_json::from_str(&json).map_err(|source| CollectorError::Encoding {
        path: path.display().to_string(),
        source,
    })
}

fn export_error(path: &Path, source: std::io::Error) -> CollectorError {
    CollectorError::Export {
        path: path.display().to_string(),
        source,
    }
}
