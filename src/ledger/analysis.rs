//! Analysis aggregator: fallacies, assumptions, and per-side scores.
//!
//! Every operation returns a new `AnalysisState`; the persistent
//! collections make the copy cheap.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::points::PointLedger;
use crate::case::ClaimPoint;
use crate::core::{Side, SideMap};

/// Standing of a key assumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssumptionState {
    Held,
    Challenged,
    Broken,
}

impl AssumptionState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            AssumptionState::Held => "HELD",
            AssumptionState::Challenged => "CHALLENGED",
            AssumptionState::Broken => "BROKEN",
        }
    }
}

/// A tracked assumption, keyed by `(side, assumption)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssumptionRecord {
    pub side: Side,
    pub assumption: String,
    pub state: AssumptionState,
}

/// A fallacy the counsel attributed to a side, tagged with its exchange.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallacyRecord {
    pub side: Side,
    #[serde(rename = "type")]
    pub kind: String,
    pub context: String,
    pub exchange_number: u32,
}

/// A fallacy as reported for the current round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallacyReport {
    pub side: Side,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub context: String,
}

/// An assumption state change as reported for the current round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumptionUpdate {
    pub side: Side,
    pub assumption: String,
    pub new_state: AssumptionState,
}

/// Summary counts for one side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub valid_points: u32,
    /// Cumulative over the whole match.
    pub fallacies: u32,
    pub challenged: u32,
}

/// Everything the aggregator tracks for a match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub assumptions: Vector<AssumptionRecord>,
    /// Append-only.
    pub fallacies: Vector<FallacyRecord>,
    pub scores: SideMap<Score>,
}

impl AnalysisState {
    /// Initial analysis for freshly dealt claims.
    #[must_use]
    pub fn for_points(prosecution: &Vector<ClaimPoint>, defense: &Vector<ClaimPoint>) -> Self {
        Self::default().recalc_scores(prosecution, defense)
    }

    /// Score for a side.
    #[must_use]
    pub fn score(&self, side: Side) -> Score {
        self.scores[side]
    }

    /// Append fallacies for `exchange_number` and recount per-side totals.
    #[must_use]
    pub fn apply_fallacies(&self, reports: &[FallacyReport], exchange_number: u32) -> Self {
        let mut next = self.clone();

        for report in reports {
            next.fallacies.push_back(FallacyRecord {
                side: report.side,
                kind: report.kind.clone(),
                context: report.context.clone(),
                exchange_number,
            });
        }

        for side in Side::ALL {
            next.scores[side].fallacies =
                next.fallacies.iter().filter(|f| f.side == side).count() as u32;
        }

        next
    }

    /// Upsert assumptions by exact `(side, assumption)`; last writer wins.
    #[must_use]
    pub fn apply_assumptions(&self, updates: &[AssumptionUpdate]) -> Self {
        let mut next = self.clone();

        for update in updates {
            let existing = next
                .assumptions
                .iter()
                .position(|a| a.side == update.side && a.assumption == update.assumption);

            match existing {
                Some(idx) => {
                    if let Some(record) = next.assumptions.get_mut(idx) {
                        record.state = update.new_state;
                    }
                }
                None => next.assumptions.push_back(AssumptionRecord {
                    side: update.side,
                    assumption: update.assumption.clone(),
                    state: update.new_state,
                }),
            }
        }

        next
    }

    /// Recompute valid/challenged counts from the current claim lists.
    ///
    /// Idempotent; fallacy counts are left alone.
    #[must_use]
    pub fn recalc_scores(
        &self,
        prosecution: &Vector<ClaimPoint>,
        defense: &Vector<ClaimPoint>,
    ) -> Self {
        let mut next = self.clone();

        for (side, points) in [(Side::Attorney, prosecution), (Side::Defendant, defense)] {
            let tally = PointLedger::tally(points);
            next.scores[side].valid_points = tally.valid_points;
            next.scores[side].challenged = tally.challenged;
        }

        next
    }
}
