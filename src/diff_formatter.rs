use crate::file_processor::{ChangeType, FileOutcome, FileReport, SkipReason};
use crate::presets::{Preset, PresetMode};
use crate::rule::RuleSet;
use crate::walker::RunSummary;
use anyhow::{Context, Result};
use colored::*;
use std::io::IsTerminal;
use std::path::Path;

pub struct DiffFormatter;

impl DiffFormatter {
    /// Auto-detect if we should use colors
    pub fn should_use_color() -> bool {
        // Check NO_COLOR env var (https://no-color.org/)
        if std::env::var_os("NO_COLOR").is_some() {
            return false;
        }

        std::io::stdout().is_terminal()
    }

    /// One status line for a processed file, or None for files with nothing to report
    pub fn format_status(report: &FileReport, display_path: &Path) -> Option<String> {
        Self::format_status_styled(report, display_path, Self::should_use_color())
    }

    fn format_status_styled(report: &FileReport, display_path: &Path, use_color: bool) -> Option<String> {
        let path = display_path.display().to_string();

        let (label, detail) = match &report.outcome {
            FileOutcome::Updated { .. } => ("Updated", None),
            FileOutcome::WouldUpdate { .. } => ("Would update", None),
            FileOutcome::Skipped { reason: SkipReason::Undecodable } => {
                ("Skipped", Some("not valid UTF-8".to_string()))
            }
            FileOutcome::Failed { error } => ("Failed", Some(error.clone())),
            FileOutcome::Unchanged => return None,
        };

        let line = if use_color {
            let label = match report.outcome {
                FileOutcome::Updated { .. } => label.green().bold(),
                FileOutcome::WouldUpdate { .. } => label.yellow().bold(),
                FileOutcome::Skipped { .. } => label.dimmed(),
                _ => label.red().bold(),
            };
            match detail {
                Some(detail) => format!("{} {} ({})", label, path.cyan(), detail.dimmed()),
                None => format!("{} {}", label, path.cyan()),
            }
        } else {
            match detail {
                Some(detail) => format!("{} {} ({})", label, path, detail),
                None => format!("{} {}", label, path),
            }
        };

        Some(line)
    }

    /// Format a changed file's diff with context lines around each change
    pub fn format_diff_with_context(report: &FileReport, display_path: &Path, context_size: usize) -> String {
        Self::format_diff_styled(report, display_path, context_size, Self::should_use_color())
    }

    fn format_diff_styled(report: &FileReport, display_path: &Path, context_size: usize, use_color: bool) -> String {
        let mut output = String::new();
        if report.all_lines.is_empty() {
            return output;
        }

        let path = display_path.display().to_string();
        if use_color {
            output.push_str(&format!("{}\n", path.bold().cyan()));
        } else {
            output.push_str(&format!("{}\n", path));
        }

        for (line_num, content, change_type) in Self::filter_lines_with_context(&report.all_lines, context_size) {
            // Placeholder between distant groups
            if line_num == 0 && content == "..." {
                if use_color {
                    output.push_str(&format!("{}\n", "...".dimmed()));
                } else {
                    output.push_str("...\n");
                }
                continue;
            }

            let indicator = match change_type {
                ChangeType::Unchanged => "=",
                ChangeType::Modified => "~",
                ChangeType::Added => "+",
                ChangeType::Deleted => "-",
            };

            if use_color {
                let colored_line = match change_type {
                    ChangeType::Unchanged => format!("L{}: {} {}\n", line_num, indicator.dimmed(), content.dimmed()),
                    ChangeType::Modified => format!("L{}: {} {}\n", line_num, indicator.yellow().bold(), content.yellow().bold()),
                    ChangeType::Added => format!("L{}: {} {}\n", line_num, indicator.green().bold(), content.green().bold()),
                    ChangeType::Deleted => format!("L{}: {} {}\n", line_num, indicator.red().bold(), content.red()),
                };
                output.push_str(&colored_line);
            } else {
                output.push_str(&format!("L{}: {} {}\n", line_num, indicator, content));
            }
        }

        let replacements = report.replacements();
        output.push_str(&format!(
            "{} replacement{}\n\n",
            replacements,
            if replacements == 1 { "" } else { "s" }
        ));

        output
    }

    /// Filter lines to show only changed lines with context, grouping close changes
    fn filter_lines_with_context(
        lines: &[(usize, String, ChangeType)],
        context_size: usize
    ) -> Vec<(usize, String, ChangeType)> {
        if context_size == 0 {
            // Show only changed lines
            return lines.iter()
                .filter(|(_, _, ct)| *ct != ChangeType::Unchanged)
                .cloned()
                .collect();
        }

        let changed_indices: Vec<usize> = lines.iter()
            .enumerate()
            .filter(|(_, (_, _, ct))| *ct != ChangeType::Unchanged)
            .map(|(i, _)| i)
            .collect();

        let Some(&first) = changed_indices.first() else {
            return Vec::new();
        };

        // Two changes share a group if they're within (context_size * 2 + 1) lines
        let group_threshold = context_size * 2 + 1;
        let mut groups: Vec<(usize, usize)> = vec![(first, first)];

        for &idx in &changed_indices[1..] {
            match groups.last_mut() {
                Some((_, end)) if idx.saturating_sub(*end) <= group_threshold => *end = idx,
                _ => groups.push((idx, idx)),
            }
        }

        let mut result = Vec::new();
        let mut last_included_end = None;

        for (group_start, group_end) in groups {
            let start = group_start.saturating_sub(context_size);
            let end = (group_end + context_size + 1).min(lines.len());

            if let Some(last_end) = last_included_end {
                if start > last_end {
                    result.push((0, "...".to_string(), ChangeType::Unchanged));
                }
            }

            result.extend(lines[start..end].iter().cloned());
            last_included_end = Some(end);
        }

        result
    }

    /// Closing line of a run
    pub fn format_summary(summary: &RunSummary, dry_run: bool) -> String {
        Self::format_summary_styled(summary, dry_run, Self::should_use_color())
    }

    fn format_summary_styled(summary: &RunSummary, dry_run: bool, use_color: bool) -> String {
        let verb = if dry_run { "would update" } else { "updated" };
        let mut parts = vec![format!("{} {}", summary.updated, verb)];
        parts.push(format!("{} unchanged", summary.unchanged));
        if summary.skipped > 0 {
            parts.push(format!("{} skipped", summary.skipped));
        }
        if summary.failed > 0 {
            parts.push(format!("{} failed", summary.failed));
        }

        let line = format!(
            "Scanned {} file{}: {} ({} replacement{})",
            summary.scanned,
            if summary.scanned == 1 { "" } else { "s" },
            parts.join(", "),
            summary.replacements,
            if summary.replacements == 1 { "" } else { "s" }
        );

        if use_color {
            if summary.failed > 0 {
                line.red().to_string()
            } else {
                line.bold().to_string()
            }
        } else {
            line
        }
    }

    pub fn format_json(summary: &RunSummary) -> Result<String> {
        serde_json::to_string_pretty(summary).context("Failed to serialize run summary")
    }

    /// Rules as they will be applied, in order
    pub fn format_rules(rules: &RuleSet) -> String {
        let mut output = String::new();
        for (i, rule) in rules.rules().iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, rule));
        }
        output
    }

    pub fn format_presets(presets: &[Preset]) -> Result<String> {
        let use_color = Self::should_use_color();
        let mut output = String::new();

        for preset in presets {
            let mode = match preset.mode {
                PresetMode::Tree => format!("tree{}", preset.extension.map(|e| format!(", {}", e)).unwrap_or_default()),
                PresetMode::File => "file".to_string(),
            };
            if use_color {
                output.push_str(&format!("{} ({})\n", preset.name.bold().yellow(), mode));
            } else {
                output.push_str(&format!("{} ({})\n", preset.name, mode));
            }
            output.push_str(&format!("  {}\n", preset.description));
            output.push_str(&Self::format_rules(&preset.rules()?));
            output.push('\n');
        }

        Ok(output)
    }

    /// Format dry run header
    pub fn format_dry_run_header(rule_count: usize) -> String {
        let use_color = Self::should_use_color();
        let text = format!(
            "Dry run: {} rule{}, no files will be written",
            rule_count,
            if rule_count == 1 { "" } else { "s" }
        );

        if use_color {
            format!("{}\n", text.bold().cyan())
        } else {
            format!("{}\n", text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_processor::generate_line_diff;
    use std::path::PathBuf;

    fn report(outcome: FileOutcome, original: &str, modified: &str) -> FileReport {
        let mut report = FileReport::new(Path::new("inc/page.php"), outcome);
        report.all_lines = generate_line_diff(original, modified);
        report
    }

    #[test]
    fn test_status_lines() {
        let path = PathBuf::from("inc/page.php");
        let updated = FileReport::new(&path, FileOutcome::Updated { replacements: 1 });
        assert_eq!(
            DiffFormatter::format_status_styled(&updated, &path, false).unwrap(),
            "Updated inc/page.php"
        );

        let skipped = FileReport::new(&path, FileOutcome::Skipped { reason: SkipReason::Undecodable });
        assert_eq!(
            DiffFormatter::format_status_styled(&skipped, &path, false).unwrap(),
            "Skipped inc/page.php (not valid UTF-8)"
        );

        let unchanged = FileReport::new(&path, FileOutcome::Unchanged);
        assert!(DiffFormatter::format_status_styled(&unchanged, &path, false).is_none());
    }

    #[test]
    fn test_diff_shows_context_and_gap() {
        let original = "childcare\n2\n3\n4\n5\n6\n7\n8\nchildcare\n";
        let modified = "pediatric therapy\n2\n3\n4\n5\n6\n7\n8\npediatric therapy\n";
        let r = report(FileOutcome::WouldUpdate { replacements: 2 }, original, modified);

        let out = DiffFormatter::format_diff_styled(&r, Path::new("inc/page.php"), 1, false);

        assert!(out.starts_with("inc/page.php\n"));
        assert!(out.contains("L1: ~ pediatric therapy\n"));
        assert!(out.contains("L2: = 2\n"));
        assert!(out.contains("...\n"));
        assert!(!out.contains("L5: "));
        assert!(out.contains("L9: ~ pediatric therapy\n"));
        assert!(out.contains("2 replacements"));
    }

    #[test]
    fn test_diff_without_context() {
        let r = report(FileOutcome::Updated { replacements: 1 }, "a\nchildcare\nb\n", "a\npediatric therapy\nb\n");
        let out = DiffFormatter::format_diff_styled(&r, Path::new("x.php"), 0, false);
        assert_eq!(out, "x.php\nL2: ~ pediatric therapy\n1 replacement\n\n");
    }

    #[test]
    fn test_unchanged_file_has_no_diff() {
        let r = FileReport::new(Path::new("x.php"), FileOutcome::Unchanged);
        assert!(DiffFormatter::format_diff_styled(&r, Path::new("x.php"), 2, false).is_empty());
    }

    #[test]
    fn test_summary_line() {
        let mut summary = RunSummary::default();
        summary.record(FileReport::new(Path::new("a.php"), FileOutcome::Updated { replacements: 3 }));
        summary.record(FileReport::new(Path::new("b.php"), FileOutcome::Unchanged));
        summary.record(FileReport::new(
            Path::new("c.php"),
            FileOutcome::Skipped { reason: SkipReason::Undecodable },
        ));

        assert_eq!(
            DiffFormatter::format_summary_styled(&summary, false, false),
            "Scanned 3 files: 1 updated, 1 unchanged, 1 skipped (3 replacements)"
        );
    }

    #[test]
    fn test_json_summary() {
        let mut summary = RunSummary::default();
        summary.record(FileReport::new(Path::new("a.php"), FileOutcome::Updated { replacements: 2 }));
        summary.record(FileReport::new(
            Path::new("b.php"),
            FileOutcome::Skipped { reason: SkipReason::Undecodable },
        ));

        let json: serde_json::Value = serde_json::from_str(&DiffFormatter::format_json(&summary).unwrap()).unwrap();
        assert_eq!(json["updated"], 1);
        assert_eq!(json["files"][0]["status"], "updated");
        assert_eq!(json["files"][0]["replacements"], 2);
        assert_eq!(json["files"][1]["reason"], "undecodable");
    }
}
