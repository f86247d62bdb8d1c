// Document enumeration and reading.
//
// A path resolves to an ordered list of documents: a file is a single
// document, a directory contributes its plain-file children sorted by name.
// Sorting makes unit id assignment deterministic across runs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// A document to analyze. The raw text is read lazily, once, and not
/// retained here afterwards.
#[derive(Debug, Clone)]
pub struct Document {
    /// Display name for reports (the path as given).
    pub source: String,
    path: PathBuf,
}

impl Document {
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            source: path.display().to_string(),
            path,
        }
    }

    /// Read the whole document. Fails on I/O errors and on text that is
    /// not valid UTF-8; the caller turns either into a failed unit.
    pub fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read document {}", self.source))
    }
}

/// Resolve an input path into the ordered document list for a run.
pub fn enumerate(input: &Path) -> Result<Vec<Document>> {
    if input.is_file() {
        return Ok(vec![Document::from_path(input.to_path_buf())]);
    }

    let entries = fs::read_dir(input)
        .with_context(|| format!("Could not open input path {}", input.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    debug!(count = paths.len(), input = %input.display(), "Enumerated corpus");
    Ok(paths.into_iter().map(Document::from_path).collect())
}
