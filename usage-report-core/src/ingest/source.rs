//! Log sources: where raw log text comes from.
//!
//! The pipeline only needs newline-delimited text for a date range. A
//! [`LogSource`] supplies it; date filtering happens at file granularity,
//! individual lines are never filtered by their own timestamp.

use crate::error::{Error, Result};
use crate::period::DateRange;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Supplier of raw log text for a date range.
pub trait LogSource {
    /// Short description for logs and error messages.
    fn name(&self) -> &str;

    /// Raw text of every log file belonging to `range`, joined by newlines.
    fn fetch(&self, range: &DateRange) -> Result<String>;
}

/// Log files in a local directory, selected by glob pattern and
/// modification date.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    pattern: String,
    name: String,
}

impl DirectorySource {
    /// Create a source for files under `root` matching `pattern`
    /// (relative to `root`, e.g. `*.log`).
    pub fn new(root: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        let root = root.into();
        let name = format!("directory {}", root.display());
        Self {
            root,
            pattern: pattern.into(),
            name,
        }
    }

    /// Files matching the pattern whose modification date is in `range`,
    /// sorted by path.
    pub fn discover_files(&self, range: &DateRange) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(Error::Source {
                source_name: self.name.clone(),
                message: "not a directory".to_string(),
            });
        }

        let full_pattern = self.root.join(&self.pattern);
        let pattern_str = full_pattern.to_string_lossy();

        let entries = glob::glob(&pattern_str).map_err(|e| Error::Source {
            source_name: self.name.clone(),
            message: format!("invalid glob pattern: {}", e),
        })?;

        let mut files = Vec::new();
        for entry in entries.flatten() {
            if !entry.is_file() {
                continue;
            }
            let Some(modified) = modified_at(&entry) else {
                tracing::warn!(path = %entry.display(), "Skipping file without modification time");
                continue;
            };
            if range.contains(modified.date_naive()) {
                files.push(entry);
            } else {
                tracing::trace!(path = %entry.display(), "Outside report range");
            }
        }

        files.sort();
        Ok(files)
    }
}

fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .ok()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from)
}

impl LogSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, range: &DateRange) -> Result<String> {
        let files = self.discover_files(range)?;
        tracing::info!(
            source = %self.name,
            range = %range,
            files = files.len(),
            "Reading log files"
        );

        let mut contents = Vec::with_capacity(files.len());
        for path in &files {
            contents.push(std::fs::read_to_string(path)?);
        }
        Ok(contents.join("\n"))
    }
}

/// A single log file, read whole regardless of the date range.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file {}", path.display());
        Self { path, name }
    }
}

impl LogSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, _range: &DateRange) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| Error::Source {
            source_name: self.name.clone(),
            message: e.to_string(),
        })
    }
}
