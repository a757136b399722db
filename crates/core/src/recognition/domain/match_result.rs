use serde::{Deserialize, Serialize};

use crate::detection::domain::detection::Detection;

/// Identity assigned to one detection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "lowercase")]
pub enum MatchLabel {
    Known(String),
    Unmatched,
}

impl MatchLabel {
    pub fn as_known(&self) -> Option<&str> {
        match self {
            MatchLabel::Known(label) => Some(label),
            MatchLabel::Unmatched => None,
        }
    }
}

impl std::fmt::Display for MatchLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchLabel::Known(label) => write!(f, "{label}"),
            MatchLabel::Unmatched => write!(f, "unmatched"),
        }
    }
}

/// Outcome of matching one detection against the gallery.
///
/// `score` is the cosine similarity against the chosen reference embedding,
/// or 0 when no label was assigned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub label: MatchLabel,
    pub score: f64,
}

impl MatchResult {
    pub fn known(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: MatchLabel::Known(label.into()),
            score,
        }
    }

    pub fn unmatched() -> Self {
        Self {
            label: MatchLabel::Unmatched,
            score: 0.0,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self.label, MatchLabel::Known(_))
    }
}

/// A fused detection paired with its identity, ready for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedFace {
    pub detection: Detection,
    pub result: MatchResult,
}
