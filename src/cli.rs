use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RuleFile;
use crate::presets::{self, Preset};
use crate::rule::{parse_pair, MatchKind, Rule, RuleSet};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

License: MIT
Rust Edition: 2024"
);

#[derive(Parser)]
#[command(name = "swapx")]
#[command(about = "Bulk, word-boundary aware text rewriting across files")]
#[command(long_about = "SwapX renames strings across a directory tree or a single file.

Word rules (--word) only replace stand-alone tokens: a match next to a letter,
digit or underscore is left alone, so renaming 'childcare' keeps identifiers like
'childcare_discovery' and 'ChildCareSchema' intact. Each word rule is applied in
lowercase, Title Case and UPPERCASE. Literal rules (--literal) replace every
occurrence of the exact substring.

Rules run in the order given: preset rules first, then rule-file rules, then
--word/--literal flags.

EXAMPLES:
  swapx tree ./inc --ext php --word childcare='pediatric therapy'
  swapx tree ./inc --preset pediatric-therapy --dry-run
  swapx file routes.php --literal chroma_faq=earlystart_faq
  swapx file routes.php --preset earlystart-prefix
  swapx tree ./src --rules renames.toml --json")]
#[command(version, long_version = LONG_VERSION)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug, Default)]
struct RuleArgs {
    /// Word-bounded rename applied in lower, Title and UPPER case
    #[arg(short, long = "word", value_name = "FROM=TO")]
    words: Vec<String>,

    /// Literal substring replacement
    #[arg(short, long = "literal", value_name = "FROM=TO")]
    literals: Vec<String>,

    /// Match --word and --literal patterns case-insensitively (no case variants)
    #[arg(long)]
    ignore_case: bool,

    /// TOML file with [[rule]] entries
    #[arg(short, long = "rules", value_name = "FILE")]
    rules_file: Option<PathBuf>,

    /// Built-in rule set (see 'swapx presets')
    #[arg(short, long, value_name = "NAME")]
    preset: Option<String>,
}

#[derive(ClapArgs, Debug, Default)]
struct OutputArgs {
    /// Preview changes without writing any file
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Number of context lines in the preview (default: from config, 2)
    #[arg(short = 'n', long, value_name = "NUM")]
    context: Option<usize>,

    /// Print a JSON summary instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite every matching file under a directory
    #[command(long_about = "Recursively rewrite every file under ROOT whose name ends with the
extension filter. Files that are not valid UTF-8 are skipped. Files whose content
does not change are never written. A failure on one file is reported and the
walk continues; the exit status is non-zero if any file failed.

EXAMPLES:
  swapx tree ./inc --ext php --word childcare='pediatric therapy'
  swapx tree ./inc --preset pediatric-therapy --dry-run -n 0")]
    Tree {
        /// Directory to walk
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// File extension filter, with or without the dot (default: from config, .php)
        #[arg(short, long, value_name = "EXT")]
        ext: Option<String>,

        #[command(flatten)]
        rules: RuleArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rewrite one file
    #[command(long_about = "Apply the rules to a single file and write the result back.

The file is written even when nothing matched, unless --only-if-changed is given.
A file that is not valid UTF-8 is an error.

EXAMPLES:
  swapx file routes.php --preset earlystart-prefix
  swapx file routes.php --literal \"'_chroma_='_earlystart_\"")]
    File {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Skip the write when the content is unchanged
        #[arg(long)]
        only_if_changed: bool,

        #[command(flatten)]
        rules: RuleArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List built-in presets and their rules
    Presets,

    /// Show or create the configuration file
    #[command(long_about = "Create ~/.swapx/config.toml with defaults if it doesn't exist.

CONFIGURATION OPTIONS:
  [processing]
    extension = \".php\"          # Default tree-mode filter
    context_lines = 2            # Preview context lines (max 10)

  [logging]
    debug = false                # Also log to ~/.swapx/swapx.log

EXAMPLES:
  swapx config                   Print the config file path
  swapx config --show            Show current configuration")]
    Config {
        /// Print the effective configuration
        #[arg(long = "show")]
        show: bool,
    },
}

/// Where the rules for a run come from
#[derive(Debug, Clone, Default)]
pub struct RuleSources {
    pub preset: Option<String>,
    pub rules_file: Option<PathBuf>,
    pub words: Vec<String>,
    pub literals: Vec<String>,
    pub ignore_case: bool,
}

impl RuleSources {
    /// Build the ordered rule set: preset, then rule file, then word and literal flags
    pub fn build(&self) -> Result<RuleSet> {
        let mut set = RuleSet::new();

        if let Some(name) = &self.preset {
            set.extend(presets::find(name)?.rules()?);
        }

        if let Some(path) = &self.rules_file {
            set.extend(RuleFile::load(path)?.into_rule_set()?);
        }

        for pair in &self.words {
            let (from, to) = parse_pair(pair)?;
            if self.ignore_case {
                set.push(Rule::new(&from, &to, MatchKind::Word, true)?);
            } else {
                set.extend(RuleSet::case_variants(&from, &to)?);
            }
        }

        for pair in &self.literals {
            let (from, to) = parse_pair(pair)?;
            set.push(Rule::new(&from, &to, MatchKind::Literal, self.ignore_case)?);
        }

        if set.is_empty() {
            anyhow::bail!("No rules given. Use --word, --literal, --rules or --preset");
        }

        Ok(set)
    }

    pub fn preset(&self) -> Result<Option<&'static Preset>> {
        self.preset.as_deref().map(presets::find).transpose()
    }
}

impl From<RuleArgs> for RuleSources {
    fn from(args: RuleArgs) -> Self {
        Self {
            preset: args.preset,
            rules_file: args.rules_file,
            words: args.words,
            literals: args.literals,
            ignore_case: args.ignore_case,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub dry_run: bool,
    pub context: Option<usize>,
    pub json: bool,
}

impl From<OutputArgs> for OutputOptions {
    fn from(args: OutputArgs) -> Self {
        Self {
            dry_run: args.dry_run,
            context: args.context,
            json: args.json,
        }
    }
}

#[derive(Debug)]
pub enum Args {
    Tree {
        root: PathBuf,
        ext: Option<String>,
        rules: RuleSources,
        output: OutputOptions,
    },
    File {
        path: PathBuf,
        only_if_changed: bool,
        rules: RuleSources,
        output: OutputOptions,
    },
    Presets,
    Config {
        show: bool,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Verbosity {
    pub level: u8,
    pub quiet: bool,
}

pub fn parse_args() -> Result<(Args, Verbosity)> {
    from_cli(Cli::parse())
}

fn from_cli(cli: Cli) -> Result<(Args, Verbosity)> {
    let verbosity = Verbosity { level: cli.verbose, quiet: cli.quiet };

    let args = match cli.command {
        Commands::Tree { root, ext, rules, output } => {
            if let Some(ext) = &ext {
                if ext.trim().is_empty() || ext == "." {
                    anyhow::bail!("--ext cannot be empty");
                }
            }
            Args::Tree { root, ext, rules: rules.into(), output: output.into() }
        }
        Commands::File { path, only_if_changed, rules, output } => Args::File {
            path,
            only_if_changed,
            rules: rules.into(),
            output: output.into(),
        },
        Commands::Presets => Args::Presets,
        Commands::Config { show } => Args::Config { show },
    };

    if let Args::Tree { output, .. } | Args::File { output, .. } = &args {
        if let Some(n) = output.context {
            if n > 10 {
                anyhow::bail!("Invalid --context: {} (max 10)", n);
            }
        }
    }

    Ok((args, verbosity))
}
