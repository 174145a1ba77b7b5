//! Point ledger and analysis aggregator.
//!
//! - `points`: claim status updates and valid/challenged tallies
//! - `analysis`: fallacy and assumption records, per-side scores

pub mod points;
pub mod analysis;

pub use points::{PointLedger, PointTally, PointUpdate};
pub use analysis::{
    AnalysisState, AssumptionRecord, AssumptionState, AssumptionUpdate,
    FallacyRecord, FallacyReport, Score,
};
