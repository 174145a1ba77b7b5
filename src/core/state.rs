//! Match state: everything a single match owns.
//!
//! ## MatchState
//!
//! One instance per match, passed explicitly to every engine operation.
//! There is no process-wide store, so independent matches never share
//! mutable state.
//!
//! Collections use `im` persistent structures so the controller can
//! work on an O(1) clone during a round and commit it atomically.

use chrono::{DateTime, Utc};
use im::Vector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::side::Side;
use crate::case::{CaseDefinition, ClaimPoint};
use crate::controller::SuggestionList;
use crate::evidence::EvidenceRegistry;
use crate::ledger::AnalysisState;

/// Lifecycle phase of a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Idle, waiting for a new match.
    #[default]
    Splash,
    /// Case request in flight.
    Generating,
    /// Case revealed; evidence selection happens here.
    Intro,
    /// Active exchanges.
    Chat,
    /// User conceded; victory speech pending.
    Surrender,
    /// Match over. See `MatchState::outcome`.
    Ended,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Splash => "splash",
            Phase::Generating => "generating",
            Phase::Intro => "intro",
            Phase::Chat => "chat",
            Phase::Surrender => "surrender",
            Phase::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Result of a match from the user's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pending,
    Won,
    Lost,
}

/// Health pools for both sides.
///
/// Invariant: `0 <= hp <= max_hp` for both pools at all times. Fields are
/// private so only `damage` (saturating) can lower them. Loaded values
/// are clamped the same way `from_values` clamps them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawHealth")]
pub struct HealthState {
    #[serde(rename = "attorneyHP")]
    attorney_hp: u32,
    #[serde(rename = "defendantHP")]
    defendant_hp: u32,
    #[serde(rename = "maxHP")]
    max_hp: u32,
}

/// Health as stored, before clamping.
#[derive(Deserialize)]
struct RawHealth {
    #[serde(rename = "attorneyHP")]
    attorney_hp: u32,
    #[serde(rename = "defendantHP")]
    defendant_hp: u32,
    #[serde(rename = "maxHP")]
    max_hp: u32,
}

impl From<RawHealth> for HealthState {
    fn from(raw: RawHealth) -> Self {
        Self::from_values(raw.attorney_hp, raw.defendant_hp, raw.max_hp)
    }
}

impl HealthState {
    /// Both sides at full health.
    #[must_use]
    pub const fn new(max_hp: u32) -> Self {
        Self {
            attorney_hp: max_hp,
            defendant_hp: max_hp,
            max_hp,
        }
    }

    /// Explicit values, clamped into `0..=max_hp`.
    #[must_use]
    pub fn from_values(attorney_hp: u32, defendant_hp: u32, max_hp: u32) -> Self {
        Self {
            attorney_hp: attorney_hp.min(max_hp),
            defendant_hp: defendant_hp.min(max_hp),
            max_hp,
        }
    }

    /// Current HP of a side.
    #[must_use]
    pub const fn hp(&self, side: Side) -> u32 {
        match side {
            Side::Attorney => self.attorney_hp,
            Side::Defendant => self.defendant_hp,
        }
    }

    #[must_use]
    pub const fn attorney_hp(&self) -> u32 {
        self.attorney_hp
    }

    #[must_use]
    pub const fn defendant_hp(&self) -> u32 {
        self.defendant_hp
    }

    #[must_use]
    pub const fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// Lower a side's HP, stopping at zero. Returns the new HP.
    pub fn damage(&mut self, side: Side, amount: u32) -> u32 {
        let hp = match side {
            Side::Attorney => &mut self.attorney_hp,
            Side::Defendant => &mut self.defendant_hp,
        };
        *hp = hp.saturating_sub(amount);
        *hp
    }

    /// Check if a side has been knocked out.
    #[must_use]
    pub const fn is_ko(&self, side: Side) -> bool {
        self.hp(side) == 0
    }
}

/// Who sent a transcript message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Attorney,
    User,
}

/// One transcript entry. Never mutated once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
}

impl Message {
    /// Create a message stamped now.
    #[must_use]
    pub fn new(text: impl Into<String>, sender: Sender, intensity: Option<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            intensity,
        }
    }
}

/// Complete state of one match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchState {
    /// Match identity; also the history record id.
    pub id: Uuid,

    pub phase: Phase,

    /// Set once by case setup, never changed afterwards.
    pub case: Option<CaseDefinition>,

    /// Prosecution claims with their evolving status.
    pub prosecution_points: Vector<ClaimPoint>,

    /// Defense claims with their evolving status.
    pub defense_points: Vector<ClaimPoint>,

    pub analysis: AnalysisState,

    pub health: HealthState,

    /// Append-only transcript.
    pub messages: Vector<Message>,

    /// Suggestions currently offered to the user.
    pub suggestions: SuggestionList,

    pub evidence: EvidenceRegistry,

    /// Number of user messages sent so far.
    pub exchange_count: u32,

    pub outcome: Option<Outcome>,

    pub started_at: DateTime<Utc>,
}

impl MatchState {
    /// Fresh state in the `splash` phase.
    #[must_use]
    pub fn new(max_hp: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: Phase::Splash,
            case: None,
            prosecution_points: Vector::new(),
            defense_points: Vector::new(),
            analysis: AnalysisState::default(),
            health: HealthState::new(max_hp),
            messages: Vector::new(),
            suggestions: SuggestionList::new(),
            evidence: EvidenceRegistry::new(),
            exchange_count: 0,
            outcome: None,
            started_at: Utc::now(),
        }
    }

    /// Claims for one side. Attorney claims are the prosecution's.
    #[must_use]
    pub fn points(&self, side: Side) -> &Vector<ClaimPoint> {
        match side {
            Side::Attorney => &self.prosecution_points,
            Side::Defendant => &self.defense_points,
        }
    }

    /// Append a message to the transcript.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    /// Check if the match has reached a final outcome.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.outcome, Some(Outcome::Won | Outcome::Lost))
    }
}
