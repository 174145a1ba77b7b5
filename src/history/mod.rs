//! Match history: saved records, scoring, and stores.

pub mod record;
pub mod store;

pub use record::{
    match_score, RecordOutcome, SavedMatch, Visibility, MAX_EXCHANGE_POINTS,
    POINTS_PER_EXCHANGE, WIN_BONUS,
};
pub use store::{HistoryError, HistoryStore, JsonFileHistory, MemoryHistory};
