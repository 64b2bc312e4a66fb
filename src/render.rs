//! Tone rendering for matched recommendations.
//!
//! Pure string templating over `{title, recommendation}`; no side effects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rules::MatchResult;

/// Presentation tone for recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Recommendation text only.
    Concise,
    /// Title and recommendation with a friendly nudge.
    #[default]
    Friendly,
    /// Title and recommendation, plainly.
    Formal,
    /// Formal plus a pointer at the cited sources.
    Teaching,
}

impl Tone {
    /// All tones, for CLI help text.
    pub const ALL: [Self; 4] = [Self::Concise, Self::Friendly, Self::Formal, Self::Teaching];
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Concise => "concise",
            Self::Friendly => "friendly",
            Self::Formal => "formal",
            Self::Teaching => "teaching",
        };
        f.write_str(s)
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "concise" => Ok(Self::Concise),
            "friendly" => Ok(Self::Friendly),
            "formal" => Ok(Self::Formal),
            "teaching" => Ok(Self::Teaching),
            other => Err(format!(
                "unknown tone '{other}' (expected concise|friendly|formal|teaching)"
            )),
        }
    }
}

/// Renders a matched rule in the requested tone.
#[must_use]
pub fn render(m: &MatchResult, tone: Tone) -> String {
    match tone {
        Tone::Concise => m.recommendation.clone(),
        Tone::Formal => format!("{}: {}", m.title, m.recommendation),
        Tone::Teaching => format!(
            "{}: {} Rationale and examples are linked in the sources.",
            m.title, m.recommendation
        ),
        Tone::Friendly => format!("{} — {} 👍", m.title, m.recommendation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;

    fn sample() -> MatchResult {
        MatchResult {
            id: "python-ruff".to_string(),
            title: "Adopt Ruff".to_string(),
            severity: Severity::Warn,
            recommendation: "Add Ruff to pyproject.toml and enforce in CI.".to_string(),
            sources: vec!["https://docs.astral.sh/ruff/".to_string()],
        }
    }

    #[test]
    fn concise_is_recommendation_only() {
        assert_eq!(
            render(&sample(), Tone::Concise),
            "Add Ruff to pyproject.toml and enforce in CI."
        );
    }

    #[test]
    fn formal_prefixes_title() {
        let out = render(&sample(), Tone::Formal);
        assert!(out.starts_with("Adopt Ruff: "));
        assert!(!out.contains('👍'));
    }

    #[test]
    fn teaching_points_at_sources() {
        let out = render(&sample(), Tone::Teaching);
        assert!(out.contains("linked in the sources"));
    }

    #[test]
    fn friendly_is_the_default() {
        assert_eq!(Tone::default(), Tone::Friendly);
        let out = render(&sample(), Tone::Friendly);
        assert!(out.contains(" — "));
    }

    #[test]
    fn tone_parses_from_str() {
        assert_eq!("teaching".parse::<Tone>().unwrap(), Tone::Teaching);
        assert_eq!("FORMAL".parse::<Tone>().unwrap(), Tone::Formal);
        assert!("shouty".parse::<Tone>().is_err());
    }
}
