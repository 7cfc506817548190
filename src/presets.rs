//! Built-in rule sets for recurring renames

use anyhow::Result;

use crate::rule::{Rule, RuleSet};

/// Which rewriter a preset is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetMode {
    Tree,
    File,
}

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub mode: PresetMode,
    /// Default extension filter for tree presets
    pub extension: Option<&'static str>,
    build: fn() -> Result<RuleSet>,
}

impl Preset {
    pub fn rules(&self) -> Result<RuleSet> {
        (self.build)()
    }
}

const PRESETS: &[Preset] = &[
    Preset {
        name: "pediatric-therapy",
        description: "Rename stand-alone 'childcare' to 'pediatric therapy' in all case variants",
        mode: PresetMode::Tree,
        extension: Some(".php"),
        build: pediatric_therapy,
    },
    Preset {
        name: "earlystart-prefix",
        description: "Rename chroma_* API prefixes to earlystart_*",
        mode: PresetMode::File,
        extension: None,
        build: earlystart_prefix,
    },
];

fn pediatric_therapy() -> Result<RuleSet> {
    RuleSet::case_variants("childcare", "pediatric therapy")
}

fn earlystart_prefix() -> Result<RuleSet> {
    [
        ("chroma_agent_geo_feed_v2", "earlystart_agent_geo_feed_v2"),
        ("'_chroma_", "'_earlystart_"),
        ("chroma_faq", "earlystart_faq"),
        ("chroma_seo", "earlystart_seo"),
        ("chroma_llm", "earlystart_llm"),
    ]
    .into_iter()
    .map(|(from, to)| Rule::literal(from, to))
    .collect()
}

pub fn all() -> &'static [Preset] {
    PRESETS
}

pub fn find(name: &str) -> Result<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name).ok_or_else(|| {
        let names: Vec<&str> = PRESETS.iter().map(|p| p.name).collect();
        anyhow::anyhow!("Unknown preset '{}'. Available: {}", name, names.join(", "))
    })
}
