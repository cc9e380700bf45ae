//! Compiled recognition rules.
//!
//! A rule is one regex over a raw line. Rule lists are evaluated in order
//! and the first matching rule wins.

use fancy_regex::{Captures, Regex};
use tracing::warn;

/// A compiled regex rule with its source for diagnostics.
#[derive(Debug, Clone)]
pub struct Rule {
    regex: Regex,
}

impl Rule {
    /// Compile a built-in rule.
    ///
    /// Built-in patterns are literals; an invalid one is a programming error.
    pub fn new(pattern: &str) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
        }
    }

    /// Check whether the rule matches. Backtracking failures count as no match.
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line).unwrap_or_else(|e| {
            warn!("Regex match error for rule '{}': {}", self.regex.as_str(), e);
            false
        })
    }

    /// Capture groups of the first match, if any.
    pub fn captures<'t>(&self, line: &'t str) -> Option<Captures<'t>> {
        self.regex.captures(line).unwrap_or_else(|e| {
            warn!("Regex capture error for rule '{}': {}", self.regex.as_str(), e);
            None
        })
    }

    /// Capture group `index` of the first match as an owned string.
    pub fn capture(&self, line: &str, index: usize) -> Option<String> {
        self.captures(line)
            .and_then(|caps| caps.get(index).map(|m| m.as_str().to_string()))
    }
}

/// Ordered list of rules for one category.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(patterns: &[&str]) -> Self {
        Self {
            rules: patterns.iter().map(|p| Rule::new(p)).collect(),
        }
    }

    /// Index of the first matching rule.
    pub fn first_match(&self, line: &str) -> Option<usize> {
        self.rules.iter().position(|rule| rule.is_match(line))
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.first_match(line).is_some()
    }
}
