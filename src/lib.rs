//! SwapX: bulk, word-boundary aware text rewriting
//!
//! This library exposes SwapX's core functionality for use in integration tests.
//! The main binary is at src/main.rs.

pub mod cli;
pub mod config;
pub mod diff_formatter;
pub mod error_helpers;
pub mod file_processor;
pub mod logger;
pub mod presets;
pub mod rule;
pub mod walker;

// Re-export commonly used types for convenience
pub use file_processor::{ChangeType, FileOutcome, FileProcessor, FileReport, SkipReason, WritePolicy};
pub use rule::{MatchKind, Rule, RuleSet};
pub use walker::{RunSummary, TreeRewriter};
