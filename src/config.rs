//! Configuration management for SwapX
//!
//! SwapX stores user settings in ~/.swapx/config.toml. Rule files passed with
//! `--rules` are separate TOML documents holding an ordered `[[rule]]` list.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error_helpers::dir_create_error;
use crate::rule::{MatchKind, Rule, RuleSet};

/// SwapX configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Processing settings
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Default extension filter for tree mode
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Number of context lines to show in previews
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            context_lines: default_context_lines(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to ~/.swapx/swapx.log
    #[serde(default)]
    pub debug: bool,
}

fn default_extension() -> String { ".php".to_string() }
fn default_context_lines() -> usize { 2 }

const MAX_CONTEXT_LINES: usize = 10;

/// Directory holding the config file and debug log
pub fn config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".swapx"))
}

/// Get the configuration file path, creating its directory if needed
pub fn config_file_path() -> Result<PathBuf> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir).map_err(|e| anyhow::anyhow!(dir_create_error(&dir, &e)))?;
    Ok(dir.join("config.toml"))
}

/// Get the default configuration file content with comments
fn get_default_config_content() -> &'static str {
    r#"# SwapX Configuration File
#
# Values set here can be overridden by command-line flags.

[processing]
# Extension filter used by 'swapx tree' when --ext is not given (default: ".php")
extension = ".php"

# Number of context lines shown around changes in --dry-run output (default: 2, max: 10)
context_lines = 2

[logging]
# Also append logs to ~/.swapx/swapx.log (default: false)
debug = false
"#
}

/// Write the default commented configuration file to `path`
pub fn save_default_config_at(path: &Path) -> Result<()> {
    fs::write(path, get_default_config_content())
        .with_context(|| format!("Failed to write default config file: {}", path.display()))
}

/// Load configuration from `path`, creating it with defaults if missing
///
/// A malformed file is replaced with the default template.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        save_default_config_at(path)?;
    }

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = match toml::from_str(&config_str) {
        Ok(config) => config,
        Err(e) => {
            // Runs before logging is initialized
            eprintln!("Warning: malformed config file {} ({}), restoring defaults", path.display(), e.message());
            save_default_config_at(path)?;
            return Ok(Config::default());
        }
    };

    validate_config(&config)?;
    Ok(config)
}

/// Load the user configuration from ~/.swapx/config.toml
pub fn load_config() -> Result<Config> {
    load_config_from(&config_file_path()?)
}

/// Validate configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    if config.processing.context_lines > MAX_CONTEXT_LINES {
        anyhow::bail!(
            "Invalid context_lines: {} (max {})",
            config.processing.context_lines,
            MAX_CONTEXT_LINES
        );
    }

    if config.processing.extension.trim().is_empty() {
        anyhow::bail!("Invalid extension: must not be empty");
    }

    Ok(())
}

/// One `[[rule]]` entry of a rule file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntry {
    pub pattern: String,
    pub replacement: String,
    #[serde(default)]
    pub kind: MatchKind,
    #[serde(default)]
    pub ignore_case: bool,
    /// Word rules only: expand into lowercase, Title Case and UPPERCASE rules
    #[serde(default)]
    pub case_variants: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleEntry>,
}

impl RuleFile {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Malformed rule file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("In rule file: {}", path.display()))
    }

    pub fn into_rule_set(self) -> Result<RuleSet> {
        let mut set = RuleSet::new();

        for (i, entry) in self.rules.into_iter().enumerate() {
            if entry.case_variants {
                if entry.kind != MatchKind::Word {
                    anyhow::bail!("Rule {}: case_variants requires kind = \"word\"", i + 1);
                }
                if entry.ignore_case {
                    anyhow::bail!("Rule {}: case_variants and ignore_case cannot be combined", i + 1);
                }
                set.extend(
                    RuleSet::case_variants(&entry.pattern, &entry.replacement)
                        .with_context(|| format!("Rule {}", i + 1))?,
                );
            } else {
                set.push(
                    Rule::new(&entry.pattern, &entry.replacement, entry.kind, entry.ignore_case)
                        .with_context(|| format!("Rule {}", i + 1))?,
                );
            }
        }

        Ok(set)
    }
}
