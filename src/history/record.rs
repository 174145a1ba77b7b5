//! Saved match records.
//!
//! A `SavedMatch` is a frozen export of a `MatchState`. Only `starred`
//! and `visibility` change after creation.

use chrono::{DateTime, Utc};
use im::Vector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::case::{CaseDefinition, ClaimPoint};
use crate::core::{HealthState, MatchState, Message, Outcome, Phase, Side};
use crate::evidence::EvidenceRegistry;
use crate::ledger::AnalysisState;

/// Points awarded for winning.
pub const WIN_BONUS: u32 = 50;
/// Points per exchange survived.
pub const POINTS_PER_EXCHANGE: u32 = 3;
/// Cap on exchange points.
pub const MAX_EXCHANGE_POINTS: u32 = 30;

/// Outcome as stored in history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordOutcome {
    Won,
    Lost,
    InProgress,
}

impl RecordOutcome {
    #[must_use]
    pub fn from_outcome(outcome: Option<Outcome>) -> Self {
        match outcome {
            Some(Outcome::Won) => RecordOutcome::Won,
            Some(Outcome::Lost) => RecordOutcome::Lost,
            Some(Outcome::Pending) | None => RecordOutcome::InProgress,
        }
    }

    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, RecordOutcome::InProgress)
    }
}

/// Who may view a shared record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Score for a match.
///
/// `(max_hp - attorney_hp) + min(exchanges * 3, 30) + (50 if won)`.
///
/// ```
/// use courtroom_engine::history::{match_score, RecordOutcome};
///
/// assert_eq!(match_score(100, 40, 10, RecordOutcome::Won), 140);
/// ```
#[must_use]
pub fn match_score(max_hp: u32, attorney_hp: u32, exchange_count: u32, outcome: RecordOutcome) -> u32 {
    let damage_dealt = max_hp.saturating_sub(attorney_hp);
    let endurance = exchange_count
        .saturating_mul(POINTS_PER_EXCHANGE)
        .min(MAX_EXCHANGE_POINTS);
    let bonus = if outcome == RecordOutcome::Won { WIN_BONUS } else { 0 };

    damage_dealt + endurance + bonus
}

/// A durable, shareable match record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMatch {
    pub id: Uuid,
    #[serde(alias = "caseData")]
    pub case_definition: CaseDefinition,
    pub messages: Vector<Message>,
    pub outcome: RecordOutcome,
    pub final_health: HealthState,
    pub exchange_count: u32,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub prosecution_points: Vector<ClaimPoint>,
    #[serde(default)]
    pub defense_points: Vector<ClaimPoint>,
    #[serde(default)]
    pub analysis: AnalysisState,
    #[serde(default)]
    pub evidence: EvidenceRegistry,
}

impl SavedMatch {
    /// Export a match. Returns `None` before a case exists.
    #[must_use]
    pub fn from_state(state: &MatchState) -> Option<Self> {
        let case_definition = state.case.clone()?;
        let outcome = RecordOutcome::from_outcome(state.outcome);

        Some(Self {
            id: state.id,
            case_definition,
            messages: state.messages.clone(),
            outcome,
            final_health: state.health,
            exchange_count: state.exchange_count,
            score: match_score(
                state.health.max_hp(),
                state.health.attorney_hp(),
                state.exchange_count,
                outcome,
            ),
            starred: false,
            visibility: Visibility::default(),
            created_at: Utc::now(),
            prosecution_points: state.prosecution_points.clone(),
            defense_points: state.defense_points.clone(),
            analysis: state.analysis.clone(),
            evidence: state.evidence.clone(),
        })
    }

    /// Rebuild a match state from this record.
    ///
    /// Finished records come back `ended`; in-progress ones resume in `chat`.
    #[must_use]
    pub fn to_state(&self) -> MatchState {
        let mut state = MatchState::new(self.final_health.max_hp());

        state.id = self.id;
        state.phase = if self.outcome.is_final() { Phase::Ended } else { Phase::Chat };
        state.outcome = Some(match self.outcome {
            RecordOutcome::Won => Outcome::Won,
            RecordOutcome::Lost => Outcome::Lost,
            RecordOutcome::InProgress => Outcome::Pending,
        });
        state.case = Some(self.case_definition.clone());
        state.messages = self.messages.clone();
        state.health = self.final_health;
        state.exchange_count = self.exchange_count;
        state.analysis = self.analysis.clone();
        state.evidence = self.evidence.clone();
        state.started_at = self.created_at;

        // Older records carry no point tables; fall back to the case's.
        state.prosecution_points = if self.prosecution_points.is_empty() {
            self.case_definition.points(Side::Attorney).iter().cloned().collect()
        } else {
            self.prosecution_points.clone()
        };
        state.defense_points = if self.defense_points.is_empty() {
            self.case_definition.points(Side::Defendant).iter().cloned().collect()
        } else {
            self.defense_points.clone()
        };

        state
    }
}
