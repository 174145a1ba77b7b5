//! Engine error types.

use thiserror::Error;

use super::state::Phase;
use crate::history::HistoryError;

/// An agent payload failed the strict schema.
///
/// Validation failures are fatal to the round (or case setup) that
/// produced them: nothing is applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("point `{0}` is missing its id or claim")]
    IncompletePoint(String),

    #[error("duplicate point id `{0}`")]
    DuplicatePointId(String),

    #[error("unknown {field} value `{value}`")]
    UnknownVariant { field: &'static str, value: String },
}

/// Failure talking to an external agent.
///
/// Transport problems collapse into one kind; the engine never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error("agent transport failure: {0}")]
    Transport(String),

    #[error("agent did not answer within {0} ms")]
    Timeout(u64),

    #[error("agent payload is not valid JSON: {0}")]
    Malformed(String),
}

/// Errors surfaced by the match controller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("a round is already in flight")]
    Busy,

    #[error("operation requires phase {expected}, match is in {actual}")]
    InvalidPhase { expected: Phase, actual: Phase },

    #[error("{requested} evidence cards requested, at most {limit} allowed")]
    TooManyEvidence { requested: usize, limit: usize },

    #[error("match was reset while the round was in flight")]
    Superseded,

    #[error("evidence card `{0}` is unknown or already used")]
    EvidenceUnavailable(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
