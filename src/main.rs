use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use swapx::cli::{parse_args, Args, OutputOptions, RuleSources};
use swapx::config::{self, Config};
use swapx::diff_formatter::DiffFormatter;
use swapx::file_processor::{FileOutcome, FileProcessor, WritePolicy};
use swapx::logger;
use swapx::presets::{self, PresetMode};
use swapx::walker::{RunSummary, TreeRewriter};

fn main() -> Result<ExitCode> {
    let (args, verbosity) = parse_args()?;

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {:#}\nUsing default configuration", e);
            Config::default()
        }
    };

    let debug_dir = if config.logging.debug { config::config_dir().ok() } else { None };
    if let Some(log_path) = logger::init_logging(verbosity.level, verbosity.quiet, debug_dir.as_deref())? {
        tracing::debug!(path = %log_path.display(), "debug log enabled");
    }

    let success = match args {
        Args::Tree { root, ext, rules, output } => run_tree(&root, ext, &rules, &output, &config)?,
        Args::File { path, only_if_changed, rules, output } => {
            run_file(&path, only_if_changed, &rules, &output, &config)?
        }
        Args::Presets => {
            print!("{}", DiffFormatter::format_presets(presets::all())?);
            true
        }
        Args::Config { show } => {
            show_config(show, &config)?;
            true
        }
    };

    Ok(if success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn run_tree(
    root: &Path,
    ext: Option<String>,
    sources: &RuleSources,
    output: &OutputOptions,
    config: &Config,
) -> Result<bool> {
    let preset = sources.preset()?;
    if preset.is_some_and(|p| p.mode == PresetMode::File) {
        tracing::warn!("preset is meant for single-file rewrites; applying it to a tree");
    }

    let extension = ext
        .or_else(|| preset.and_then(|p| p.extension).map(str::to_string))
        .unwrap_or_else(|| config.processing.extension.clone());
    let context = output.context.unwrap_or(config.processing.context_lines);

    let rules = sources.build()?;
    tracing::info!(root = %root.display(), extension = %extension, rules = rules.len(), "rewriting tree");

    if output.dry_run && !output.json {
        print!("{}", DiffFormatter::format_dry_run_header(rules.len()));
        print!("{}", DiffFormatter::format_rules(&rules));
        println!();
    }

    let processor = FileProcessor::new(rules).dry_run(output.dry_run);
    let rewriter = TreeRewriter::new(root, &extension, processor);

    let summary = rewriter.run_with(|report| {
        if output.json {
            return;
        }
        let display_path = report.path.strip_prefix(root).unwrap_or(&report.path);
        if output.dry_run && !report.all_lines.is_empty() {
            print!("{}", DiffFormatter::format_diff_with_context(report, display_path, context));
        } else if let Some(line) = DiffFormatter::format_status(report, display_path) {
            println!("{}", line);
        }
    })?;

    finish(&summary, output, "Done")?;
    Ok(!summary.has_failures())
}

fn run_file(
    path: &Path,
    only_if_changed: bool,
    sources: &RuleSources,
    output: &OutputOptions,
    config: &Config,
) -> Result<bool> {
    if sources.preset()?.is_some_and(|p| p.mode == PresetMode::Tree) {
        tracing::warn!("preset is meant for directory trees; applying it to one file");
    }

    let context = output.context.unwrap_or(config.processing.context_lines);
    let policy = if only_if_changed { WritePolicy::OnChange } else { WritePolicy::Always };

    let rules = sources.build()?;
    let processor = FileProcessor::new(rules)
        .with_policy(policy)
        .dry_run(output.dry_run)
        .skip_undecodable(false);

    let report = processor
        .process_file(path)
        .with_context(|| format!("Failed to rewrite {}", path.display()))?;

    if !output.json && output.dry_run {
        print!("{}", DiffFormatter::format_diff_with_context(&report, path, context));
    }

    let message = match report.outcome {
        FileOutcome::Updated { .. } => "Updated successfully",
        FileOutcome::WouldUpdate { .. } => "Dry run: file not written",
        _ => "No changes",
    };

    let mut summary = RunSummary::default();
    summary.record(report);
    finish(&summary, output, message)?;

    Ok(true)
}

fn finish(summary: &RunSummary, output: &OutputOptions, message: &str) -> Result<()> {
    if output.json {
        println!("{}", DiffFormatter::format_json(summary)?);
    } else {
        println!("{}", DiffFormatter::format_summary(summary, output.dry_run));
        println!("{}", message);
    }
    Ok(())
}

fn show_config(show: bool, config: &Config) -> Result<()> {
    let path = config::config_file_path()?;

    if show {
        println!("# {}", path.display());
        print!("{}", toml::to_string_pretty(config).context("Failed to serialize config")?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}
