//! Match category: the four-valued coarse classification of job fit.
//!
//! A category is produced once, by whichever path ran: derived from the numeric
//! match score, or supplied by the classification provider (either as a field or
//! as a `Match Category: <value>.` prefix inside the notes). `ResolvedCategory`
//! records which path produced it so read sites never re-parse strings.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const NOTES_PREFIX: &str = "Match Category:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchCategory {
    #[serde(rename = "High Match")]
    HighMatch,
    #[serde(rename = "Medium Match")]
    MediumMatch,
    #[serde(rename = "Low Match")]
    LowMatch,
    #[serde(rename = "No Match")]
    NoMatch,
}

impl MatchCategory {
    pub const ALL: [MatchCategory; 4] = [
        Self::HighMatch,
        Self::MediumMatch,
        Self::LowMatch,
        Self::NoMatch,
    ];

    /// Fixed thresholds: ≥85 high, ≥70 medium, ≥50 low, otherwise none.
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => Self::HighMatch,
            70..=84 => Self::MediumMatch,
            50..=69 => Self::LowMatch,
            _ => Self::NoMatch,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::HighMatch => "High Match",
            Self::MediumMatch => "Medium Match",
            Self::LowMatch => "Low Match",
            Self::NoMatch => "No Match",
        }
    }
}

impl fmt::Display for MatchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MatchCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_end_matches('.').to_ascii_lowercase();
        let word = normalized
            .strip_suffix("match")
            .map(str::trim)
            .unwrap_or(normalized.as_str());
        match word {
            "high" => Ok(Self::HighMatch),
            "medium" => Ok(Self::MediumMatch),
            "low" => Ok(Self::LowMatch),
            "no" | "none" => Ok(Self::NoMatch),
            _ => Err(format!("unknown match category '{}'", s.trim())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySource {
    Provider,
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCategory {
    pub category: MatchCategory,
    pub source: CategorySource,
}

impl ResolvedCategory {
    pub fn from_provider(category: MatchCategory) -> Self {
        Self {
            category,
            source: CategorySource::Provider,
        }
    }

    pub fn from_score(score: u8) -> Self {
        Self {
            category: MatchCategory::from_score(score),
            source: CategorySource::Score,
        }
    }
}

impl CategorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Score => "score",
        }
    }
}

impl FromStr for CategorySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "provider" => Ok(Self::Provider),
            "score" => Ok(Self::Score),
            other => Err(format!("unknown category source '{other}'")),
        }
    }
}

/// Category of a provider judgment: the explicit field, then the notes prefix,
/// then the score bands. Only the last is attributed to the score.
pub fn resolve_judgment_category(
    explicit: Option<&str>,
    notes: &str,
    screening_score: u8,
) -> ResolvedCategory {
    explicit
        .and_then(|c| c.parse::<MatchCategory>().ok())
        .or_else(|| extract_match_category(notes))
        .map(ResolvedCategory::from_provider)
        .unwrap_or_else(|| ResolvedCategory::from_score(screening_score))
}

fn notes_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*match\s+category\s*:\s*(high|medium|low|no)\s+match\b\.?\s*")
            .expect("match category pattern is valid")
    })
}

/// Writes a category as the notes prefix understood by `extract_match_category`.
pub fn embed_category(category: MatchCategory) -> String {
    format!("{NOTES_PREFIX} {category}.")
}

/// Prefixes free-form notes with the category.
pub fn embed_category_in_notes(category: MatchCategory, explanation: &str) -> String {
    let explanation = explanation.trim();
    if explanation.is_empty() {
        embed_category(category)
    } else {
        format!("{} {explanation}", embed_category(category))
    }
}

/// Reads the category embedded at the start of screening notes, if any.
pub fn extract_match_category(notes: &str) -> Option<MatchCategory> {
    notes_pattern()
        .captures(notes)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// The notes with any category prefix removed.
pub fn screening_explanation(notes: &str) -> &str {
    match notes_pattern().find(notes) {
        Some(m) => notes[m.end()..].trim(),
        None => notes.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_thresholds() {
        assert_eq!(MatchCategory::from_score(100), MatchCategory::HighMatch);
        assert_eq!(MatchCategory::from_score(85), MatchCategory::HighMatch);
        assert_eq!(MatchCategory::from_score(84), MatchCategory::MediumMatch);
        assert_eq!(MatchCategory::from_score(70), MatchCategory::MediumMatch);
        assert_eq!(MatchCategory::from_score(69), MatchCategory::LowMatch);
        assert_eq!(MatchCategory::from_score(50), MatchCategory::LowMatch);
        assert_eq!(MatchCategory::from_score(49), MatchCategory::NoMatch);
        assert_eq!(MatchCategory::from_score(0), MatchCategory::NoMatch);
    }

    #[test]
    fn test_embed_then_extract_returns_same_category() {
        for category in MatchCategory::ALL {
            assert_eq!(extract_match_category(&embed_category(category)), Some(category));
        }
    }

    #[test]
    fn test_extract_category_and_explanation_from_notes() {
        let notes = "Match Category: High Match. Strong fit.";
        assert_eq!(extract_match_category(notes), Some(MatchCategory::HighMatch));
        assert_eq!(screening_explanation(notes), "Strong fit.");
    }

    #[test]
    fn test_notes_without_prefix() {
        let notes = "  Solid candidate, weak on SQL. ";
        assert_eq!(extract_match_category(notes), None);
        assert_eq!(screening_explanation(notes), "Solid candidate, weak on SQL.");
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let notes = "match category: no match - lacks every requirement";
        assert_eq!(extract_match_category(notes), Some(MatchCategory::NoMatch));
        assert_eq!(screening_explanation(notes), "- lacks every requirement");
    }

    #[test]
    fn test_embed_in_notes_keeps_explanation() {
        let notes = embed_category_in_notes(MatchCategory::LowMatch, " Needs mentoring. ");
        assert_eq!(notes, "Match Category: Low Match. Needs mentoring.");
        assert_eq!(screening_explanation(&notes), "Needs mentoring.");
    }

    #[test]
    fn test_judgment_category_source_follows_the_path_taken() {
        let explicit = resolve_judgment_category(Some("Low Match"), "", 95);
        assert_eq!(explicit, ResolvedCategory::from_provider(MatchCategory::LowMatch));

        let from_notes =
            resolve_judgment_category(None, "Match Category: No Match. Wrong stack.", 95);
        assert_eq!(from_notes.category, MatchCategory::NoMatch);
        assert_eq!(from_notes.source, CategorySource::Provider);

        let from_score = resolve_judgment_category(Some("??"), "no prefix here", 90);
        assert_eq!(from_score.category, MatchCategory::HighMatch);
        assert_eq!(from_score.source, CategorySource::Score);
    }

    #[test]
    fn test_parse_category_labels() {
        assert_eq!("High Match".parse::<MatchCategory>().unwrap(), MatchCategory::HighMatch);
        assert_eq!("medium".parse::<MatchCategory>().unwrap(), MatchCategory::MediumMatch);
        assert_eq!("No Match.".parse::<MatchCategory>().unwrap(), MatchCategory::NoMatch);
        assert!("Perfect Match".parse::<MatchCategory>().is_err());
    }

    #[test]
    fn test_category_serde_uses_display_labels() {
        let json = serde_json::to_string(&MatchCategory::MediumMatch).unwrap();
        assert_eq!(json, "\"Medium Match\"");
        let back: MatchCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MatchCategory::MediumMatch);
    }
}
