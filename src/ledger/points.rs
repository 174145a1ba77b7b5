//! Point ledger: claim status updates and per-side tallies.
//!
//! Updates come from the opposing-counsel agent, which is untrusted:
//! ids it invents are dropped, never treated as errors.

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::case::{ClaimPoint, PointStatus};

/// A status change reported by the opposing counsel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointUpdate {
    pub id: String,
    pub new_status: PointStatus,
    /// Informational only; not stored.
    #[serde(default)]
    pub reason: String,
}

impl PointUpdate {
    pub fn new(id: impl Into<String>, new_status: PointStatus) -> Self {
        Self {
            id: id.into(),
            new_status,
            reason: String::new(),
        }
    }
}

/// Per-side claim counts derived from the current claim list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointTally {
    /// Claims that are unchallenged or proven.
    pub valid_points: u32,
    /// Claims currently challenged.
    pub challenged: u32,
}

/// Applies status updates to claim lists.
pub struct PointLedger;

impl PointLedger {
    /// Apply updates in order.
    ///
    /// Each id is looked up in the prosecution list first, then in the
    /// defense list. Unknown ids are skipped. Returns the number of
    /// updates that matched a claim.
    pub fn apply_updates(
        prosecution: &mut Vector<ClaimPoint>,
        defense: &mut Vector<ClaimPoint>,
        updates: &[PointUpdate],
    ) -> usize {
        let mut applied = 0;

        for update in updates {
            if Self::set_status(prosecution, update) || Self::set_status(defense, update) {
                applied += 1;
            } else {
                debug!(id = %update.id, "dropping update for unknown point");
            }
        }

        applied
    }

    fn set_status(points: &mut Vector<ClaimPoint>, update: &PointUpdate) -> bool {
        match points.iter().position(|p| p.id == update.id) {
            Some(idx) => {
                if let Some(point) = points.get_mut(idx) {
                    point.status = update.new_status;
                }
                true
            }
            None => false,
        }
    }

    /// Count valid and challenged claims. Refuted claims count toward neither.
    #[must_use]
    pub fn tally<'a>(points: impl IntoIterator<Item = &'a ClaimPoint>) -> PointTally {
        points.into_iter().fold(PointTally::default(), |mut tally, point| {
            if point.status.is_valid() {
                tally.valid_points += 1;
            } else if point.status == PointStatus::Challenged {
                tally.challenged += 1;
            }
            tally
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(prefix: &str, n: usize) -> Vector<ClaimPoint> {
        (1..=n)
            .map(|i| ClaimPoint::new(format!("{prefix}{i}"), "claim", "evidence"))
            .collect()
    }

    #[test]
    fn test_update_prosecution_point() {
        let mut pros = side("A", 3);
        let mut def = side("D", 3);

        let applied = PointLedger::apply_updates(
            &mut pros,
            &mut def,
            &[PointUpdate::new("A2", PointStatus::Challenged)],
        );

        assert_eq!(applied, 1);
        assert_eq!(pros[1].status, PointStatus::Challenged);
        assert!(def.iter().all(|p| p.status == PointStatus::Unchallenged));
    }

    #[test]
    fn test_update_defense_point() {
        let mut pros = side("A", 2);
        let mut def = side("D", 2);

        PointLedger::apply_updates(
            &mut pros,
            &mut def,
            &[PointUpdate::new("D1", PointStatus::Refuted)],
        );

        assert_eq!(def[0].status, PointStatus::Refuted);
    }

    #[test]
    fn test_unknown_ids_ignored() {
        let mut pros = side("A", 2);
        let mut def = side("D", 2);
        let before = (pros.clone(), def.clone());

        let applied = PointLedger::apply_updates(
            &mut pros,
            &mut def,
            &[
                PointUpdate::new("Z9", PointStatus::Proven),
                PointUpdate::new("", PointStatus::Refuted),
            ],
        );

        assert_eq!(applied, 0);
        assert_eq!((pros, def), before);
    }

    #[test]
    fn test_later_update_wins() {
        let mut pros = side("A", 1);
        let mut def = side("D", 1);

        PointLedger::apply_updates(
            &mut pros,
            &mut def,
            &[
                PointUpdate::new("A1", PointStatus::Challenged),
                PointUpdate::new("A1", PointStatus::Proven),
            ],
        );

        assert_eq!(pros[0].status, PointStatus::Proven);
    }

    #[test]
    fn test_tally() {
        let points = vec![
            ClaimPoint::new("D1", "c", "e"),
            ClaimPoint::new("D2", "c", "e").with_status(PointStatus::Proven),
            ClaimPoint::new("D3", "c", "e").with_status(PointStatus::Challenged),
            ClaimPoint::new("D4", "c", "e").with_status(PointStatus::Refuted),
        ];

        let tally = PointLedger::tally(&points);
        assert_eq!(tally.valid_points, 2);
        assert_eq!(tally.challenged, 1);
    }
}
