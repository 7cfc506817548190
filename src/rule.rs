//! Substitution rules
//!
//! A `Rule` pairs a pattern with a literal replacement. Word-bounded rules only
//! rewrite stand-alone tokens: a match is rejected when the character right
//! before or right after it is alphanumeric or `_`, so `childcare` matches in
//! "the childcare center" but not in `childcare_discovery`.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a rule's pattern is located in the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Stand-alone tokens only (neighbours must not be alphanumeric or `_`)
    Word,
    /// Every occurrence of the substring
    #[default]
    Literal,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Word => write!(f, "word"),
            MatchKind::Literal => write!(f, "literal"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pattern: String,
    replacement: String,
    kind: MatchKind,
    ignore_case: bool,
    matcher: Regex,
}

impl Rule {
    pub fn new(pattern: &str, replacement: &str, kind: MatchKind, ignore_case: bool) -> Result<Self> {
        if pattern.is_empty() {
            anyhow::bail!("Rule pattern cannot be empty (replacement: '{}')", replacement);
        }

        // The pattern is always matched literally; regex only buys us case folding.
        let matcher = RegexBuilder::new(&regex::escape(pattern))
            .case_insensitive(ignore_case)
            .build()
            .with_context(|| format!("Invalid rule pattern: {}", pattern))?;

        Ok(Self {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            kind,
            ignore_case,
            matcher,
        })
    }

    pub fn word(pattern: &str, replacement: &str) -> Result<Self> {
        Self::new(pattern, replacement, MatchKind::Word, false)
    }

    pub fn literal(pattern: &str, replacement: &str) -> Result<Self> {
        Self::new(pattern, replacement, MatchKind::Literal, false)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Byte ranges of every occurrence this rule would replace, left to right
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        let mut matches = Vec::new();
        let mut pos = 0;

        while pos <= text.len() {
            let Some(m) = self.matcher.find_at(text, pos) else {
                break;
            };

            if self.kind == MatchKind::Literal || is_standalone(text, m.start(), m.end()) {
                matches.push((m.start(), m.end()));
                pos = m.end();
            } else {
                // Rejected candidate: retry one character further on
                let step = text[m.start()..].chars().next().map_or(1, char::len_utf8);
                pos = m.start() + step;
            }
        }

        matches
    }

    /// Apply the rule, returning the new text and the number of replacements
    pub fn apply(&self, text: &str) -> (String, usize) {
        let matches = self.find_matches(text);
        if matches.is_empty() {
            return (text.to_string(), 0);
        }

        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for (start, end) in &matches {
            result.push_str(&text[last..*start]);
            result.push_str(&self.replacement);
            last = *end;
        }
        result.push_str(&text[last..]);

        (result, matches.len())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] '{}' -> '{}'", self.kind, self.pattern, self.replacement)?;
        if self.ignore_case {
            write!(f, " (ignore case)")?;
        }
        Ok(())
    }
}

/// Characters that glue a token into a larger identifier
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_standalone(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start].chars().next_back().is_none_or(|c| !is_word_char(c));
    let after_ok = text[end..].chars().next().is_none_or(|c| !is_word_char(c));
    before_ok && after_ok
}

/// Uppercase the first letter of every whitespace-separated word, lowercase the rest
pub fn title_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut at_word_start = true;

    for c in s.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            result.push(c);
        } else if at_word_start {
            result.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            result.extend(c.to_lowercase());
        }
    }

    result
}

/// An ordered list of rules; each rule sees the previous rule's output
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn extend(&mut self, other: RuleSet) {
        self.rules.extend(other.rules);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Word-bounded lowercase, Title Case and UPPERCASE rules for one rename
    ///
    /// `case_variants("childcare", "pediatric therapy")` yields
    /// `childcare -> pediatric therapy`, `Childcare -> Pediatric Therapy` and
    /// `CHILDCARE -> PEDIATRIC THERAPY`. Variants whose pattern repeats an
    /// earlier one (e.g. for "42") are dropped.
    pub fn case_variants(from: &str, to: &str) -> Result<Self> {
        let candidates = [
            (from.to_lowercase(), to.to_lowercase()),
            (title_case(from), title_case(to)),
            (from.to_uppercase(), to.to_uppercase()),
        ];

        let mut set = RuleSet::new();
        for (pattern, replacement) in candidates {
            if set.rules.iter().any(|r| r.pattern == pattern) {
                continue;
            }
            set.push(Rule::word(&pattern, &replacement)?);
        }

        Ok(set)
    }

    /// Apply every rule in order, returning the new text and the total replacement count
    pub fn apply(&self, text: &str) -> (String, usize) {
        let mut current = text.to_string();
        let mut total = 0;

        for rule in &self.rules {
            let (next, count) = rule.apply(&current);
            if count > 0 {
                tracing::trace!(rule = %rule, count, "rule matched");
                current = next;
                total += count;
            }
        }

        (current, total)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self { rules: iter.into_iter().collect() }
    }
}

/// Parse a `FROM=TO` pair as given on the command line
pub fn parse_pair(pair: &str) -> Result<(String, String)> {
    let (from, to) = pair
        .split_once('=')
        .with_context(|| format!("Invalid rule '{}': expected FROM=TO", pair))?;

    if from.is_empty() {
        anyhow::bail!("Invalid rule '{}': FROM cannot be empty", pair);
    }

    Ok((from.to_string(), to.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn childcare_rules() -> RuleSet {
        RuleSet::case_variants("childcare", "pediatric therapy").unwrap()
    }

    #[test]
    fn test_standalone_token_replaced() {
        let (out, count) = childcare_rules().apply("The childcare center.");
        assert_eq!(out, "The pediatric therapy center.");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_compound_identifiers_untouched() {
        let input = "The childcare center offers childcare_discovery services and ChildCareSchema markup.";
        let (out, count) = childcare_rules().apply(input);
        assert_eq!(
            out,
            "The pediatric therapy center offers childcare_discovery services and ChildCareSchema markup."
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn test_underscore_and_alnum_neighbours_block_match() {
        let rules = childcare_rules();
        for input in ["_childcare", "childcare_", "xchildcare", "childcare2", "my_childcare_key"] {
            let (out, count) = rules.apply(input);
            assert_eq!(out, input, "should not touch {}", input);
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn test_punctuation_neighbours_allow_match() {
        let (out, _) = childcare_rules().apply("'childcare', (Childcare) CHILDCARE-center");
        assert_eq!(out, "'pediatric therapy', (Pediatric Therapy) PEDIATRIC THERAPY-center");
    }

    #[test]
    fn test_case_variants_independent() {
        let rules = childcare_rules();
        assert_eq!(rules.apply("CHILDCARE").0, "PEDIATRIC THERAPY");
        assert_eq!(rules.apply("Childcare").0, "Pediatric Therapy");
        assert_eq!(rules.apply("childcare").0, "pediatric therapy");
        // Mixed case that matches none of the variants stays as is
        assert_eq!(rules.apply("ChildCare").0, "ChildCare");
    }

    #[test]
    fn test_rejected_candidate_does_not_hide_later_match() {
        let rule = Rule::word("aa", "X").unwrap();
        // "aaa" has no stand-alone "aa"; the following one does
        assert_eq!(rule.apply("aaa aa").0, "aaa X");
    }

    #[test]
    fn test_unicode_neighbours() {
        let rule = Rule::word("care", "help").unwrap();
        assert_eq!(rule.apply("écare care é").0, "écare help é");
    }

    #[test]
    fn test_literal_rule_ignores_boundaries() {
        let rule = Rule::literal("chroma_", "earlystart_").unwrap();
        let (out, count) = rule.apply("x_chroma_faq chroma_seo");
        assert_eq!(out, "x_earlystart_faq earlystart_seo");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_ignore_case_rule() {
        let rule = Rule::new("foo", "bar", MatchKind::Word, true).unwrap();
        assert_eq!(rule.apply("Foo FOO foo food").0, "bar bar bar food");
    }

    #[test]
    fn test_replacement_is_not_expanded() {
        let rule = Rule::literal("a", "$1${x}").unwrap();
        assert_eq!(rule.apply("a").0, "$1${x}");
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(Rule::literal("", "x").is_err());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("pediatric therapy"), "Pediatric Therapy");
        assert_eq!(title_case("CHILDCARE"), "Childcare");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_case_variants_dedup() {
        let rules = RuleSet::case_variants("42", "43").unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_rules_apply_in_order() {
        let rules: RuleSet = [
            Rule::literal("a", "b").unwrap(),
            Rule::literal("b", "c").unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(rules.apply("ab").0, "cc");
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("chroma_faq=earlystart_faq").unwrap(),
            ("chroma_faq".to_string(), "earlystart_faq".to_string())
        );
        assert_eq!(parse_pair("a=b=c").unwrap(), ("a".to_string(), "b=c".to_string()));
        assert_eq!(parse_pair("gone=").unwrap(), ("gone".to_string(), String::new()));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }
}
