//! Directory tree rewriting
//!
//! Walks every file under a root whose name ends with the configured extension
//! (symlinked files included, symlinked directories not entered)
//! and runs it through a [`FileProcessor`]. A failure on one file is recorded in
//! its report and never stops the walk; only problems with the root itself are
//! fatal.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error_helpers::describe_io_error;
use crate::file_processor::{FileOutcome, FileProcessor, FileReport};

/// Aggregate result of one run
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub scanned: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub replacements: usize,
    pub files: Vec<FileReport>,
}

impl RunSummary {
    pub fn record(&mut self, report: FileReport) {
        self.scanned += 1;
        self.replacements += report.replacements();
        match report.outcome {
            FileOutcome::Updated { .. } | FileOutcome::WouldUpdate { .. } => self.updated += 1,
            FileOutcome::Unchanged => self.unchanged += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
        self.files.push(report);
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Normalize an extension filter so `php` and `.php` mean the same thing
pub fn normalize_extension(ext: &str) -> String {
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

pub struct TreeRewriter {
    root: PathBuf,
    extension: String,
    processor: FileProcessor,
}

impl TreeRewriter {
    pub fn new(root: impl Into<PathBuf>, extension: &str, processor: FileProcessor) -> Self {
        Self {
            root: root.into(),
            extension: normalize_extension(extension),
            processor,
        }
    }

    fn matches_filter(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&self.extension))
    }

    /// Files under the root that pass the extension filter, in walk order
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|e| describe_io_error(&self.root, "opening tree root", e))?;
        if !metadata.is_dir() {
            anyhow::bail!("Not a directory: {}", self.root.display());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(e).with_context(|| format!("Failed to read tree root: {}", self.root.display()));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            // Symlinked directories are not descended; symlinked files are rewritten through the link
            let is_file = entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file());
            if is_file && self.matches_filter(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Rewrite every matching file, calling `on_file` as each report comes in
    pub fn run_with<F>(&self, mut on_file: F) -> Result<RunSummary>
    where
        F: FnMut(&FileReport),
    {
        let files = self.collect_files()?;
        tracing::debug!(root = %self.root.display(), count = files.len(), "collected files");

        let mut summary = RunSummary::default();
        for path in files {
            let report = match self.processor.process_file(&path) {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to rewrite file");
                    FileReport::new(&path, FileOutcome::Failed { error: format!("{:#}", e) })
                }
            };
            on_file(&report);
            summary.record(report);
        }

        Ok(summary)
    }

    pub fn run(&self) -> Result<RunSummary> {
        self.run_with(|_| {})
    }
}
