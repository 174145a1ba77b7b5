//! Suggested replies and the surrender-last rule.
//!
//! Suggestions come from an external agent. Before they reach the user
//! the controller guarantees that a surrender entry, if present, is last,
//! and that one exists once the match is long enough.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::ValidationError;

/// Canonical surrender text. Submitting it concedes the match.
pub const SURRENDER_TEXT: &str = "...I surrender.";

/// Suggestions offered at once; agents send 4-6.
pub type SuggestionList = SmallVec<[Suggestion; 6]>;

/// Rhetorical flavor of a suggestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Objection,
    Evidence,
    Dramatic,
    #[default]
    Strategic,
    Surrender,
}

impl std::str::FromStr for SuggestionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "objection" => Ok(SuggestionKind::Objection),
            "evidence" => Ok(SuggestionKind::Evidence),
            "dramatic" => Ok(SuggestionKind::Dramatic),
            "strategic" => Ok(SuggestionKind::Strategic),
            "surrender" => Ok(SuggestionKind::Surrender),
            _ => Err(ValidationError::UnknownVariant {
                field: "suggestion type",
                value: s.to_string(),
            }),
        }
    }
}

/// Display variant of a suggestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionVariant {
    #[default]
    Default,
    Surrender,
}

impl std::str::FromStr for SuggestionVariant {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(SuggestionVariant::Default),
            "surrender" => Ok(SuggestionVariant::Surrender),
            _ => Err(ValidationError::UnknownVariant {
                field: "suggestion variant",
                value: s.to_string(),
            }),
        }
    }
}

/// A reply the user can send with one tap.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub variant: SuggestionVariant,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, kind: SuggestionKind) -> Self {
        Self {
            text: text.into(),
            kind,
            variant: SuggestionVariant::Default,
        }
    }

    /// The canonical surrender entry.
    #[must_use]
    pub fn surrender() -> Self {
        Self {
            text: SURRENDER_TEXT.to_string(),
            kind: SuggestionKind::Surrender,
            variant: SuggestionVariant::Surrender,
        }
    }

    #[must_use]
    pub fn is_surrender(&self) -> bool {
        self.variant == SuggestionVariant::Surrender
    }
}

/// Suggestions used when the suggestion agent fails.
#[must_use]
pub fn fallback_suggestions() -> SuggestionList {
    SmallVec::from_vec(vec![
        Suggestion::new("OBJECTION! That claim has no foundation.", SuggestionKind::Objection),
        Suggestion::new("Let me present my evidence.", SuggestionKind::Evidence),
        Suggestion::new("Your Honor, the prosecution is grasping at straws!", SuggestionKind::Dramatic),
        Suggestion::new("Walk me through your reasoning, step by step.", SuggestionKind::Strategic),
    ])
}

/// Keep at most one surrender entry, at the end, and append the canonical
/// one once `exchange_count >= threshold` if none is present.
///
/// When the agent sends several surrender entries only the last survives.
/// Below the threshold nothing is added.
#[must_use]
pub fn enforce_surrender_last(
    mut suggestions: SuggestionList,
    exchange_count: u32,
    threshold: u32,
) -> SuggestionList {
    if let Some(idx) = suggestions.iter().rposition(Suggestion::is_surrender) {
        let entry = suggestions.remove(idx);
        suggestions.retain(|s| !s.is_surrender());
        suggestions.push(entry);
    } else if exchange_count >= threshold {
        suggestions.push(Suggestion::surrender());
    }

    if exchange_count >= threshold {
        // The final entry must be the canonical text, whatever the agent wrote.
        if let Some(last) = suggestions.last_mut() {
            *last = Suggestion::surrender();
        }
    }

    suggestions
}
