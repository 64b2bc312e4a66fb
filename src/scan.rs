//! Repository scanner producing a [`FactSet`].
//!
//! A plain directory traversal. By contract this never fails for a readable
//! root: unreadable subpaths are skipped, not fatal.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::facts::{FactSet, FactValue};

/// Directories that never contain project source worth scanning.
const SKIP_DIRS: [&str; 8] = [
    ".git",
    "node_modules",
    "venv",
    ".venv",
    "dist",
    "build",
    ".tox",
    "__pycache__",
];

/// File names that indicate an ESLint setup.
const ESLINT_CONFIGS: [&str; 5] = [
    ".eslintrc",
    ".eslintrc.js",
    ".eslintrc.cjs",
    ".eslintrc.json",
    "eslint.config.js",
];

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIP_DIRS.contains(&name))
}

fn has_js_extension(name: &str) -> bool {
    [".js", ".ts", ".mjs", ".cjs"]
        .iter()
        .any(|ext| name.ends_with(ext))
}

/// Walks a repository and derives its structural facts.
///
/// Facts recorded: `language` (set; at least `"python"` and `"javascript"`
/// are detected), `has_ruff` (a `pyproject.toml` mentioning `tool.ruff`),
/// `has_eslint` (a known ESLint config file), and `py_version_hint` (null
/// until a detector exists).
#[must_use]
pub fn scan_repo(root: &Path) -> FactSet {
    let mut languages: BTreeSet<String> = BTreeSet::new();
    let mut has_ruff = false;
    let mut has_eslint = false;
    let mut file_count: u64 = 0;

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry));

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        file_count += 1;

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        if name.ends_with(".py") {
            languages.insert("python".to_string());
        }
        if has_js_extension(name) {
            languages.insert("javascript".to_string());
        }
        if name == "pyproject.toml" {
            // Unreadable or non-UTF-8 files are skipped, not fatal.
            if let Ok(text) = std::fs::read_to_string(entry.path()) {
                if text.contains("tool.ruff") {
                    has_ruff = true;
                }
            }
        }
        if ESLINT_CONFIGS.contains(&name) {
            has_eslint = true;
        }
    }

    debug!(
        root = %root.display(),
        files = file_count,
        languages = ?languages,
        has_ruff,
        has_eslint,
        "repository scan complete"
    );

    let mut facts = FactSet::new();
    facts.set("language", FactValue::Set(languages));
    facts.set("has_ruff", FactValue::Bool(has_ruff));
    facts.set("has_eslint", FactValue::Bool(has_eslint));
    facts.set("py_version_hint", FactValue::Null);
    facts
}
