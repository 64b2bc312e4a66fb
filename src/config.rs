//! Static configuration: feed sources and the rule store.
//!
//! Settings are read-only at runtime. They come either from the built-in
//! defaults below or from a JSON file with the same shape.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, AdvisorResult};
use crate::rules::{Rule, Severity};

/// Which fetch capability a source is ingested with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Atom/RSS feed.
    #[default]
    Rss,
    /// Raw HTML page (snapshot only, no items).
    Html,
    /// Reserved; currently skipped during ingestion.
    Json,
    /// Reserved; currently skipped during ingestion.
    Auto,
}

/// One configured external feed.
///
/// `url` doubles as the correlation key for knowledge-base rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Human-readable source name, used in logs and reports.
    pub name: String,
    /// Feed or page URL.
    pub url: String,
    /// How to fetch and parse this source.
    #[serde(default)]
    pub parser: ParserKind,
}

impl Source {
    /// Convenience constructor for an RSS/Atom source.
    #[must_use]
    pub fn rss(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            parser: ParserKind::Rss,
        }
    }
}

/// The full static configuration for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Feeds to ingest on `--refresh`, in ingestion order.
    pub sources: Vec<Source>,
    /// The rule store, in evaluation order.
    pub rules: Vec<Rule>,
}

impl Settings {
    /// The built-in defaults: release feeds for CPython, Ruff and ESLint,
    /// plus three starter rules.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            sources: vec![
                Source::rss(
                    "CPython Releases",
                    "https://github.com/python/cpython/releases.atom",
                ),
                Source::rss(
                    "Ruff Releases",
                    "https://github.com/astral-sh/ruff/releases.atom",
                ),
                Source::rss(
                    "ESLint Releases",
                    "https://github.com/eslint/eslint/releases.atom",
                ),
            ],
            rules: vec![
                Rule {
                    id: "py-docstrings".to_string(),
                    title: "Add function docstrings (PEP 257)".to_string(),
                    applies_if: predicate(&[("language", "python")]),
                    recommendation: "Enable docstring checks (e.g., Ruff pydocstyle) for public APIs."
                        .to_string(),
                    severity: Severity::Info,
                    sources: vec![
                        "https://peps.python.org/pep-0257/".to_string(),
                        "https://docs.astral.sh/ruff/rules/".to_string(),
                    ],
                },
                Rule {
                    id: "python-ruff".to_string(),
                    title: "Adopt Ruff".to_string(),
                    applies_if: predicate(&[("language", "python"), ("has_ruff", "false")]),
                    recommendation: "Add Ruff to pyproject.toml and enforce in CI.".to_string(),
                    severity: Severity::Warn,
                    sources: vec!["https://docs.astral.sh/ruff/".to_string()],
                },
                Rule {
                    id: "js-eslint-prettier".to_string(),
                    title: "Ensure ESLint + Prettier".to_string(),
                    applies_if: predicate(&[("language", "javascript"), ("has_eslint", "false")]),
                    recommendation: "Configure ESLint (recommended) and Prettier; run in CI."
                        .to_string(),
                    severity: Severity::Warn,
                    sources: vec![
                        "https://eslint.org/docs/latest/use/getting-started".to_string(),
                        "https://prettier.io/docs/en/".to_string(),
                    ],
                },
            ],
        }
    }

    /// Loads settings from a JSON file.
    ///
    /// # Errors
    /// Returns a config error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> AdvisorResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AdvisorError::config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| AdvisorError::config(format!("{}: {e}", path.display())))
    }
}

fn predicate(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
