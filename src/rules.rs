//! Declarative rules and the matcher that evaluates them against facts.
//!
//! A rule's predicate is a conjunction of (fact-name, expected-value) entries;
//! there is no OR/NOT support by design. Matching is pure, performs no I/O,
//! and preserves rule-definition order in its output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::facts::FactSet;

/// Display severity of a recommendation.
///
/// Ordered `Info < Warn < Error`. Used for presentation and sorting only;
/// the matcher never filters by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational suggestion.
    #[default]
    Info,
    /// Worth fixing soon.
    Warn,
    /// Likely causing problems today.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A declarative (predicate, recommendation) pair.
///
/// `id` is the stable, human-assigned primary key across rule-store edits.
/// Rules are immutable once loaded for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique, stable identifier.
    pub id: String,
    /// Short human-readable title.
    pub title: String,
    /// Conjunctive predicate: every entry must hold for the rule to apply.
    /// An empty map always matches.
    #[serde(default)]
    pub applies_if: BTreeMap<String, String>,
    /// Templated recommendation text.
    pub recommendation: String,
    /// Display severity.
    #[serde(default)]
    pub severity: Severity,
    /// Citation URLs, in display order.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Rule {
    /// Evaluates this rule's predicate against a fact set.
    ///
    /// Every `applies_if` entry must succeed (logical AND). Evaluation has no
    /// side effects; evaluating one rule never affects another.
    #[must_use]
    pub fn applies(&self, facts: &FactSet) -> bool {
        self.applies_if
            .iter()
            .all(|(name, expected)| facts.satisfies(name, expected))
    }
}

/// A matched rule with the metadata the renderer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Identifier of the matched rule.
    pub id: String,
    /// Title of the matched rule.
    pub title: String,
    /// Display severity.
    pub severity: Severity,
    /// Recommendation text.
    pub recommendation: String,
    /// Citation URLs.
    pub sources: Vec<String>,
}

impl From<&Rule> for MatchResult {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            title: rule.title.clone(),
            severity: rule.severity,
            recommendation: rule.recommendation.clone(),
            sources: rule.sources.clone(),
        }
    }
}

/// Evaluates every rule against the facts, in rule-definition order.
///
/// The output order equals the input order (stable, not sorted by severity).
/// This function cannot fail.
#[must_use]
pub fn match_rules(rules: &[Rule], facts: &FactSet) -> Vec<MatchResult> {
    rules
        .iter()
        .filter(|rule| rule.applies(facts))
        .map(MatchResult::from)
        .collect()
}
