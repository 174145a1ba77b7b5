//! External agent contracts.
//!
//! - `payload`: raw, loosely-typed agent responses
//! - `normalize`: strict validation into engine types
//! - `context`: the plain-text context bundle sent with each call
//! - `traits`: async seams for the case generator, counsel, and suggester

pub mod payload;
pub mod normalize;
pub mod context;
pub mod traits;

pub use payload::{
    parse_payload, AssumptionPayload, CasePayload, CounselPayload, FallacyPayload,
    PointPayload, PointUpdatePayload, SuggestionEntryPayload, SuggestionPayload,
};
pub use normalize::{
    normalize_case, normalize_counsel, normalize_suggestions, CounselReply, SuggestionSet,
    SURRENDER_INTENSITY,
};
pub use context::ContextBundle;
pub use traits::{
    call_agent, Agents, CaseGenerator, CounselRequest, OpposingCounsel, SuggestionAgent,
    SuggestionRequest,
};
