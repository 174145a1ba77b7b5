//! Match phase controller.
//!
//! - `controller`: the phase machine and round flow
//! - `suggestions`: post-processing of suggested replies

#[allow(clippy::module_inception)]
pub mod controller;
pub mod suggestions;

pub use controller::{MatchController, RoundEvent, RoundReport, OPENING_INTENSITY};
pub use suggestions::{
    enforce_surrender_last, fallback_suggestions, Suggestion, SuggestionKind, SuggestionList,
    SuggestionVariant, SURRENDER_TEXT,
};
