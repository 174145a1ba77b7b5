//! Case definitions: the premise of a match and both sides' claims.
//!
//! A `CaseDefinition` is built once, from the case generator's payload,
//! and never changes afterwards. The match keeps its own copies of the
//! claim lists so their statuses can evolve while the definition stays
//! frozen.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::{Side, ValidationError};

/// Challenge status of a claim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStatus {
    #[default]
    Unchallenged,
    Challenged,
    Refuted,
    Proven,
}

impl PointStatus {
    /// Check if the claim still counts as a valid point.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, PointStatus::Unchallenged | PointStatus::Proven)
    }

    /// Lowercase label as used in agent payloads.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            PointStatus::Unchallenged => "unchallenged",
            PointStatus::Challenged => "challenged",
            PointStatus::Refuted => "refuted",
            PointStatus::Proven => "proven",
        }
    }
}

impl std::str::FromStr for PointStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unchallenged" => Ok(PointStatus::Unchallenged),
            "challenged" => Ok(PointStatus::Challenged),
            "refuted" => Ok(PointStatus::Refuted),
            "proven" => Ok(PointStatus::Proven),
            _ => Err(ValidationError::UnknownVariant {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for PointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An atomic argument unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimPoint {
    /// Match-scoped identifier such as `"A1"` or `"D2"`.
    pub id: String,
    pub claim: String,
    /// Supporting evidence text.
    pub evidence: String,
    #[serde(default)]
    pub status: PointStatus,
}

impl ClaimPoint {
    /// Create an unchallenged claim.
    pub fn new(id: impl Into<String>, claim: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            claim: claim.into(),
            evidence: evidence.into(),
            status: PointStatus::Unchallenged,
        }
    }

    /// Set the initial status.
    #[must_use]
    pub fn with_status(mut self, status: PointStatus) -> Self {
        self.status = status;
        self
    }
}

/// Narrative text of a case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseText {
    pub title: String,
    pub charge: String,
    pub context: String,
    /// The genuinely debatable question under the absurd premise.
    #[serde(rename = "philosophical_tension")]
    pub central_tension: String,
    pub opening_statement: String,
}

/// Immutable definition of a match's premise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDefinition {
    #[serde(flatten)]
    text: CaseText,
    #[serde(rename = "attorney_points")]
    prosecution: Vec<ClaimPoint>,
    #[serde(rename = "defendant_points")]
    defense: Vec<ClaimPoint>,
}

impl CaseDefinition {
    /// Build a validated case.
    ///
    /// Title, charge, context and opening statement must be non-empty,
    /// both claim lists must be non-empty, and every claim needs an id
    /// and a claim text. Ids must be unique across both sides.
    pub fn new(
        text: CaseText,
        prosecution: Vec<ClaimPoint>,
        defense: Vec<ClaimPoint>,
    ) -> Result<Self, ValidationError> {
        require_text("title", &text.title)?;
        require_text("charge", &text.charge)?;
        require_text("context", &text.context)?;
        require_text("opening_statement", &text.opening_statement)?;

        if prosecution.is_empty() {
            return Err(ValidationError::EmptyField("attorney_points"));
        }
        if defense.is_empty() {
            return Err(ValidationError::EmptyField("defendant_points"));
        }

        let mut seen = HashSet::new();
        for point in prosecution.iter().chain(defense.iter()) {
            if point.id.trim().is_empty() || point.claim.trim().is_empty() {
                return Err(ValidationError::IncompletePoint(point.id.clone()));
            }
            if !seen.insert(point.id.as_str()) {
                return Err(ValidationError::DuplicatePointId(point.id.clone()));
            }
        }

        Ok(Self { text, prosecution, defense })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.text.title
    }

    #[must_use]
    pub fn charge(&self) -> &str {
        &self.text.charge
    }

    #[must_use]
    pub fn context(&self) -> &str {
        &self.text.context
    }

    #[must_use]
    pub fn central_tension(&self) -> &str {
        &self.text.central_tension
    }

    #[must_use]
    pub fn opening_statement(&self) -> &str {
        &self.text.opening_statement
    }

    /// Initial claims for a side.
    #[must_use]
    pub fn points(&self, side: Side) -> &[ClaimPoint] {
        match side {
            Side::Attorney => &self.prosecution,
            Side::Defendant => &self.defense,
        }
    }

    /// Find an initial defense claim by id.
    #[must_use]
    pub fn defense_point(&self, id: &str) -> Option<&ClaimPoint> {
        self.defense.iter().find(|p| p.id == id)
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}
