//! Repository facts and their comparison semantics.
//!
//! A [`FactSet`] is the output of the repository scanner and the input to the
//! rule matcher. Values carry an explicit kind so that rule predicates are
//! dispatched by type instead of stringify-and-compare: set membership for
//! language sets, `"true"`/`"false"` coercion for booleans, case-insensitive
//! equality for text, and the literal `"none"` for unknown values.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// String form an absent or unknown fact compares against.
const NULL_FORM: &str = "none";

/// A single derived observation about a scanned repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FactValue {
    /// A set of names, e.g. the detected languages.
    Set(BTreeSet<String>),
    /// A yes/no observation, e.g. "a linter config is present".
    Bool(bool),
    /// A free-form string observation.
    Text(String),
    /// The observation was attempted but could not be determined.
    Null,
}

impl FactValue {
    /// Evaluates this value against a rule's expected string.
    ///
    /// Dispatch is by kind:
    /// - `Set`: membership test, case-sensitive (language names are
    ///   conventionally lowercase and rule authors must match the scanner's
    ///   casing);
    /// - `Bool`: the value is coerced to `"true"`/`"false"` and compared
    ///   case-insensitively;
    /// - `Text`: case-insensitive equality;
    /// - `Null`: equal to the literal `"none"`, case-insensitively.
    #[must_use]
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            Self::Set(members) => members.contains(expected),
            Self::Bool(b) => {
                let coerced = if *b { "true" } else { "false" };
                coerced.eq_ignore_ascii_case(expected)
            }
            Self::Text(s) => s.eq_ignore_ascii_case(expected),
            Self::Null => NULL_FORM.eq_ignore_ascii_case(expected),
        }
    }

    /// Returns true if this is a set value.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Returns the boolean value, if this is a boolean fact.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// An opaque mapping from fact name to observed value.
///
/// Produced by the scanner, read by the rule matcher. Transient and
/// single-call-scoped; missing keys are treated as absent, never as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactSet {
    values: BTreeMap<String, FactValue>,
}

impl FactSet {
    /// Creates an empty fact set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an observation, replacing any previous value for the name.
    pub fn set(&mut self, name: impl Into<String>, value: FactValue) {
        self.values.insert(name.into(), value);
    }

    /// Looks up a fact by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FactValue> {
        self.values.get(name)
    }

    /// Evaluates a single predicate entry against this fact set.
    ///
    /// Absent keys behave exactly like [`FactValue::Null`]: they satisfy only
    /// an expected value of `"none"`.
    #[must_use]
    pub fn satisfies(&self, name: &str, expected: &str) -> bool {
        match self.values.get(name) {
            Some(value) => value.matches(expected),
            None => NULL_FORM.eq_ignore_ascii_case(expected),
        }
    }

    /// The detected language set, empty if the scanner recorded none.
    #[must_use]
    pub fn languages(&self) -> BTreeSet<String> {
        match self.values.get("language") {
            Some(FactValue::Set(s)) => s.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// Number of recorded facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no facts have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
