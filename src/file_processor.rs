use anyhow::{Context, Result};
use serde::Serialize;
use similar::{DiffTag, TextDiff};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error_helpers::describe_io_error;
use crate::rule::RuleSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChangeType {
    Unchanged,    // Line not modified
    Modified,     // Line content changed
    Added,        // Replacement introduced a new line
    Deleted,      // Replacement removed a line
}

#[derive(Debug, Clone, Serialize)]
pub struct LineChange {
    pub line_number: usize,
    pub change_type: ChangeType,
    pub content: String,
}

/// When the rewritten content goes back to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Only write when the content differs; untouched files keep their mtime
    #[default]
    OnChange,
    /// Always write the result back, even if nothing matched
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Content is not valid UTF-8
    Undecodable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Updated { replacements: usize },
    WouldUpdate { replacements: usize },
    Unchanged,
    Skipped { reason: SkipReason },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
    /// Every line of the rewritten file with its change type; empty unless content changed
    #[serde(skip)]
    pub all_lines: Vec<(usize, String, ChangeType)>,
}

impl FileReport {
    pub fn new(path: &Path, outcome: FileOutcome) -> Self {
        Self {
            path: path.to_path_buf(),
            outcome,
            all_lines: Vec::new(),
        }
    }

    /// Changed lines only
    pub fn changes(&self) -> Vec<LineChange> {
        self.all_lines
            .iter()
            .filter(|(_, _, change_type)| *change_type != ChangeType::Unchanged)
            .map(|(line_number, content, change_type)| LineChange {
                line_number: *line_number,
                change_type: change_type.clone(),
                content: content.clone(),
            })
            .collect()
    }

    pub fn replacements(&self) -> usize {
        match self.outcome {
            FileOutcome::Updated { replacements } | FileOutcome::WouldUpdate { replacements } => {
                replacements
            }
            _ => 0,
        }
    }
}

/// Read, rewrite and write back one file at a time
pub struct FileProcessor {
    rules: RuleSet,
    policy: WritePolicy,
    dry_run: bool,
    skip_undecodable: bool,
}

impl FileProcessor {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            policy: WritePolicy::OnChange,
            dry_run: false,
            skip_undecodable: true,
        }
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// When false, non UTF-8 content is an error instead of a skip
    pub fn skip_undecodable(mut self, skip: bool) -> Self {
        self.skip_undecodable = skip;
        self
    }

    /// Apply the rule set to in-memory text
    pub fn rewrite(&self, content: &str) -> (String, usize) {
        self.rules.apply(content)
    }

    pub fn process_file(&self, file_path: &Path) -> Result<FileReport> {
        let bytes = fs::read(file_path).map_err(|e| describe_io_error(file_path, "reading", e))?;

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) if self.skip_undecodable => {
                tracing::debug!(path = %file_path.display(), error = %e, "skipping undecodable file");
                return Ok(FileReport::new(
                    file_path,
                    FileOutcome::Skipped { reason: SkipReason::Undecodable },
                ));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("File is not valid UTF-8: {}", file_path.display()));
            }
        };

        let (rewritten, replacements) = self.rewrite(&content);
        let changed = rewritten != content;
        tracing::debug!(path = %file_path.display(), replacements, changed, "processed file");

        let all_lines = if changed {
            generate_line_diff(&content, &rewritten)
        } else {
            Vec::new()
        };

        let outcome = if self.dry_run {
            if changed {
                FileOutcome::WouldUpdate { replacements }
            } else {
                FileOutcome::Unchanged
            }
        } else if changed || self.policy == WritePolicy::Always {
            write_atomic(file_path, &rewritten)?;
            tracing::info!(path = %file_path.display(), replacements, "updated file");
            FileOutcome::Updated { replacements }
        } else {
            FileOutcome::Unchanged
        };

        Ok(FileReport {
            path: file_path.to_path_buf(),
            outcome,
            all_lines,
        })
    }
}

/// Line-level view of a rewrite, numbered by the rewritten file
///
/// Deleted lines carry their line number in the original file.
pub fn generate_line_diff(original: &str, modified: &str) -> Vec<(usize, String, ChangeType)> {
    let diff = TextDiff::from_lines(original, modified);
    let old_lines = diff.old_slices();
    let new_lines = diff.new_slices();
    let strip = |s: &str| s.trim_end_matches(['\n', '\r']).to_string();

    let mut result = Vec::new();
    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                for i in new_range {
                    result.push((i + 1, strip(new_lines[i]), ChangeType::Unchanged));
                }
            }
            DiffTag::Delete => {
                for i in old_range {
                    result.push((i + 1, strip(old_lines[i]), ChangeType::Deleted));
                }
            }
            DiffTag::Insert => {
                for i in new_range {
                    result.push((i + 1, strip(new_lines[i]), ChangeType::Added));
                }
            }
            DiffTag::Replace => {
                let paired = old_range.len().min(new_range.len());
                for i in new_range.clone().take(paired) {
                    result.push((i + 1, strip(new_lines[i]), ChangeType::Modified));
                }
                for i in new_range.skip(paired) {
                    result.push((i + 1, strip(new_lines[i]), ChangeType::Added));
                }
                for i in old_range.skip(paired) {
                    result.push((i + 1, strip(old_lines[i]), ChangeType::Deleted));
                }
            }
        }
    }

    result
}

/// Rewrite the file behind `file_path` with `content`
///
/// Symlinks are resolved so the link survives and its target is rewritten.
/// The replacement goes through a temp file next to the resolved target, except
/// for files with several hard links, which are rewritten in place to keep the
/// links sharing one inode.
fn write_atomic(file_path: &Path, content: &str) -> Result<()> {
    let target = fs::canonicalize(file_path).map_err(|e| describe_io_error(file_path, "resolving", e))?;

    let metadata = fs::metadata(&target).map_err(|e| describe_io_error(&target, "reading metadata of", e))?;

    if has_other_links(&metadata) {
        tracing::debug!(path = %target.display(), "hard-linked file, writing in place");
        return fs::write(&target, content).map_err(|e| describe_io_error(&target, "writing", e));
    }

    let parent_dir = target.parent().unwrap_or(Path::new("."));

    let mut temp_file = NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("Failed to create temp file in {}", parent_dir.display()))?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| "Failed to write temp file")?;
    temp_file.flush().with_context(|| "Failed to flush temp file")?;

    fs::set_permissions(temp_file.path(), metadata.permissions())
        .with_context(|| format!("Failed to copy permissions for {}", target.display()))?;

    temp_file
        .persist(&target)
        .map_err(|e| describe_io_error(&target, "writing", e.error))?;

    Ok(())
}

#[cfg(unix)]
fn has_other_links(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    metadata.nlink() > 1
}

#[cfg(not(unix))]
fn has_other_links(_metadata: &fs::Metadata) -> bool {
    false
}
