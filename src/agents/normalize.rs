//! Payload normalization: strict schema checks plus defaults and clamps.
//!
//! Missing required fields and unrecognized enum values reject the whole
//! payload. Out-of-range numbers are clamped instead. Unknown point ids
//! pass through; the ledger drops them later.

use crate::case::{CaseDefinition, CaseText, ClaimPoint, PointStatus};
use crate::controller::{Suggestion, SuggestionKind, SuggestionList, SuggestionVariant};
use crate::core::{MatchConfig, Side, ValidationError};
use crate::damage::{DamageResolver, DamageRoll};
use crate::ledger::{AssumptionState, AssumptionUpdate, FallacyReport, PointUpdate};

use super::payload::{CasePayload, CounselPayload, PointPayload, SuggestionPayload};

/// Intensity forced for the surrender victory speech.
pub const SURRENDER_INTENSITY: u8 = 10;

/// A validated opposing-counsel reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounselReply {
    pub message: String,
    pub point_updates: Vec<PointUpdate>,
    pub fallacies: Vec<FallacyReport>,
    pub assumptions: Vec<AssumptionUpdate>,
    /// Within `1..=10`.
    pub intensity: u8,
    /// Clamped damage; `bonus` is always zero here.
    pub damage: DamageRoll,
}

/// A validated suggestion response, before surrender post-processing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionSet {
    pub suggestions: SuggestionList,
    pub defense_analysis: String,
    pub recommended_strategy: String,
}

/// Turn a case generator payload into a `CaseDefinition`.
///
/// Claims without a status start `unchallenged`.
pub fn normalize_case(payload: CasePayload) -> Result<CaseDefinition, ValidationError> {
    let text = CaseText {
        title: required(payload.title, "title")?,
        charge: required(payload.charge, "charge")?,
        context: required(payload.context, "context")?,
        central_tension: payload.philosophical_tension.unwrap_or_default(),
        opening_statement: required(payload.opening_statement, "opening_statement")?,
    };

    let prosecution = normalize_points(payload.attorney_points, "attorney_points")?;
    let defense = normalize_points(payload.defendant_points, "defendant_points")?;

    CaseDefinition::new(text, prosecution, defense)
}

fn normalize_points(
    points: Option<Vec<PointPayload>>,
    field: &'static str,
) -> Result<Vec<ClaimPoint>, ValidationError> {
    let points = points.ok_or(ValidationError::MissingField(field))?;

    points
        .into_iter()
        .map(|p| -> Result<ClaimPoint, ValidationError> {
            let id = p.id.unwrap_or_default();
            let claim = p.claim.ok_or_else(|| ValidationError::IncompletePoint(id.clone()))?;
            let status = match p.status.as_deref() {
                Some(s) if !s.trim().is_empty() => s.parse::<PointStatus>()?,
                _ => PointStatus::Unchallenged,
            };
            Ok(ClaimPoint {
                id,
                claim,
                evidence: p.evidence.unwrap_or_default(),
                status,
            })
        })
        .collect()
}

/// Turn an opposing-counsel payload into a `CounselReply`.
///
/// In surrender mode the reply always deals zero damage at maximum
/// intensity, whatever the agent sent.
pub fn normalize_counsel(
    payload: CounselPayload,
    config: &MatchConfig,
    surrender: bool,
) -> Result<CounselReply, ValidationError> {
    let message = required(payload.message, "message")?;

    let point_updates = payload
        .updated_points
        .unwrap_or_default()
        .into_iter()
        .map(|u| -> Result<PointUpdate, ValidationError> {
            Ok(PointUpdate {
                id: u.id.ok_or(ValidationError::MissingField("updated_points.id"))?,
                new_status: u
                    .new_status
                    .ok_or(ValidationError::MissingField("updated_points.new_status"))?
                    .parse()?,
                reason: u.reason.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let fallacies = payload
        .fallacies_identified
        .unwrap_or_default()
        .into_iter()
        .map(|f| -> Result<FallacyReport, ValidationError> {
            Ok(FallacyReport {
                side: parse_side(f.side.as_deref(), "fallacies_identified.side")?,
                kind: required(f.kind, "fallacies_identified.type")?,
                context: f.context.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let assumptions = payload
        .assumptions_challenged
        .unwrap_or_default()
        .into_iter()
        .map(|a| -> Result<AssumptionUpdate, ValidationError> {
            Ok(AssumptionUpdate {
                side: parse_side(a.side.as_deref(), "assumptions_challenged.side")?,
                assumption: required(a.assumption, "assumptions_challenged.assumption")?,
                new_state: parse_assumption_state(a.new_state.as_deref())?,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    if surrender {
        return Ok(CounselReply {
            message,
            point_updates,
            fallacies,
            assumptions,
            intensity: SURRENDER_INTENSITY,
            damage: DamageRoll::default(),
        });
    }

    let intensity = payload
        .intensity_level
        .map(|v| v.round().clamp(1.0, 10.0) as u8)
        .unwrap_or(config.default_intensity);

    let resolver = DamageResolver::new(config);
    let damage = DamageRoll {
        attack: resolver.clamp_attack(payload.damage_to_attorney.map(round)),
        counter: resolver.clamp_counter(payload.damage_to_defendant.map(round)),
        bonus: 0,
    };

    Ok(CounselReply {
        message,
        point_updates,
        fallacies,
        assumptions,
        intensity,
        damage,
    })
}

/// Turn a suggestion payload into a `SuggestionSet`.
///
/// An empty or missing list is rejected. Missing `type` means strategic,
/// missing `variant` means default.
pub fn normalize_suggestions(payload: SuggestionPayload) -> Result<SuggestionSet, ValidationError> {
    let entries = payload
        .suggestions
        .ok_or(ValidationError::MissingField("suggestions"))?;
    if entries.is_empty() {
        return Err(ValidationError::EmptyField("suggestions"));
    }

    let suggestions = entries
        .into_iter()
        .map(|entry| -> Result<Suggestion, ValidationError> {
            let kind = match entry.kind.as_deref() {
                Some(k) if !k.trim().is_empty() => k.parse()?,
                _ => SuggestionKind::Strategic,
            };
            let variant = match entry.variant.as_deref() {
                Some(v) if !v.trim().is_empty() => v.parse()?,
                _ => SuggestionVariant::Default,
            };
            Ok(Suggestion {
                text: required(entry.text, "suggestions.text")?,
                kind,
                variant,
            })
        })
        .collect::<Result<SuggestionList, ValidationError>>()?;

    Ok(SuggestionSet {
        suggestions,
        defense_analysis: payload
            .defense_analysis
            .unwrap_or_else(|| "No analysis".to_string()),
        recommended_strategy: payload
            .recommended_strategy
            .unwrap_or_else(|| "No recommendation".to_string()),
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(ValidationError::EmptyField(field)),
        None => Err(ValidationError::MissingField(field)),
    }
}

fn round(value: f64) -> i64 {
    value.round() as i64
}

fn parse_side(value: Option<&str>, field: &'static str) -> Result<Side, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField(field))?;
    match value.trim().to_ascii_lowercase().as_str() {
        "attorney" | "prosecution" | "prosecutor" => Ok(Side::Attorney),
        "defendant" | "defense" | "defence" => Ok(Side::Defendant),
        _ => Err(ValidationError::UnknownVariant {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_assumption_state(value: Option<&str>) -> Result<AssumptionState, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField("assumptions_challenged.new_state"))?;
    match value.trim().to_ascii_uppercase().as_str() {
        "HELD" => Ok(AssumptionState::Held),
        "CHALLENGED" => Ok(AssumptionState::Challenged),
        "BROKEN" => Ok(AssumptionState::Broken),
        _ => Err(ValidationError::UnknownVariant {
            field: "assumptions_challenged.new_state",
            value: value.to_string(),
        }),
    }
}
