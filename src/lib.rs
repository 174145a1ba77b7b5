//! # courtroom-engine
//!
//! The match engine behind a chat-based courtroom battle: a defendant
//! argues against an agent-driven prosecutor, and each exchange resolves
//! into health damage, claim status changes, and transcript text.
//!
//! ## Design Principles
//!
//! 1. **Explicit Match State**: Every match is its own `MatchState` value,
//!    owned by one `MatchController`. Nothing is global, so matches and
//!    tests run side by side without interfering.
//!
//! 2. **Untrusted Agents**: Case text, counsel replies, and suggestions come
//!    from external agents as loosely-typed payloads. They are normalized
//!    into strict types before anything is applied; bad numbers are
//!    clamped, bad shapes are rejected.
//!
//! 3. **All-or-Nothing Rounds**: A round is built on a working copy and
//!    committed only after the counsel reply validates.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: O(1) cloning via `im-rs`, so working
//!   copies and history snapshots are cheap.
//!
//! - **Sequential Damage**: The user's attack lands first; an attorney KO
//!   ends the round before the counter phase. A simultaneous policy is
//!   available through `MatchConfig`.
//!
//! - **Best-Effort History**: In-progress snapshots are fire-and-forget;
//!   the terminal record is written once per match.
//!
//! ## Modules
//!
//! - `core`: Sides, health, messages, match state, configuration, errors
//! - `case`: Case definitions and claims
//! - `ledger`: Claim statuses, fallacies, assumptions, per-side scores
//! - `evidence`: One-time-use evidence cards
//! - `damage`: Damage application and KO detection
//! - `agents`: Agent seams, payload normalization, context bundles
//! - `controller`: The match phase machine and suggestion handling
//! - `history`: Saved matches, scoring, and history stores

pub mod core;
pub mod case;
pub mod ledger;
pub mod evidence;
pub mod damage;
pub mod agents;
pub mod controller;
pub mod history;

// Re-export commonly used types
pub use crate::core::{
    Side, SideMap,
    DamagePolicy, MatchConfig,
    AgentError, EngineError, Result, ValidationError,
    HealthState, MatchState, Message, Outcome, Phase, Sender,
};

pub use crate::case::{CaseDefinition, CaseText, ClaimPoint, PointStatus};

pub use crate::ledger::{
    AnalysisState, AssumptionRecord, AssumptionState, AssumptionUpdate,
    FallacyRecord, FallacyReport, PointLedger, PointUpdate, Score,
};

pub use crate::evidence::{EvidenceCard, EvidenceRegistry};

pub use crate::damage::{DamageOutcome, DamageResolver, DamageRoll, KoCheck};

pub use crate::agents::{
    parse_payload, Agents, CaseGenerator, CasePayload, ContextBundle, CounselPayload,
    CounselRequest, OpposingCounsel, SuggestionAgent, SuggestionPayload, SuggestionRequest,
    SuggestionSet,
};

pub use crate::controller::{
    MatchController, RoundEvent, RoundReport,
    Suggestion, SuggestionKind, SuggestionList, SuggestionVariant, SURRENDER_TEXT,
};

pub use crate::history::{
    match_score, HistoryError, HistoryStore, JsonFileHistory, MemoryHistory,
    RecordOutcome, SavedMatch, Visibility,
};
