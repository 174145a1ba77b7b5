//! Evidence registry: pre-selected, one-time-use defense claims.
//!
//! Cards are materialized from defense claims before the chat begins.
//! Each card can be spent exactly once; `used` never flips back.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::case::ClaimPoint;

/// A defense claim the user can deploy for a damage bonus.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceCard {
    pub id: String,
    pub claim: String,
    pub evidence: String,
    pub used: bool,
}

impl EvidenceCard {
    /// Build an unused card from a defense claim.
    #[must_use]
    pub fn from_point(point: &ClaimPoint) -> Self {
        Self {
            id: point.id.clone(),
            claim: point.claim.clone(),
            evidence: point.evidence.clone(),
            used: false,
        }
    }
}

/// Cards for one match, in selection order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRegistry {
    cards: Vector<EvidenceCard>,
}

impl EvidenceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with one card per id found in `defense`.
    ///
    /// Ids without a matching defense claim are skipped, as are repeats.
    /// No cap is enforced here; callers limit the list. Returns the
    /// number of cards registered.
    pub fn select(&mut self, defense: &Vector<ClaimPoint>, ids: &[impl AsRef<str>]) -> usize {
        let mut cards = Vector::new();

        for id in ids {
            let id = id.as_ref();
            if cards.iter().any(|c: &EvidenceCard| c.id == id) {
                continue;
            }
            if let Some(point) = defense.iter().find(|p| p.id == id) {
                cards.push_back(EvidenceCard::from_point(point));
            }
        }

        self.cards = cards;
        self.cards.len()
    }

    /// Mark a card used. Returns true only on the first call for an
    /// unused, known card; later calls are no-ops.
    pub fn use_card(&mut self, id: &str) -> bool {
        match self.cards.iter().position(|c| c.id == id && !c.used) {
            Some(idx) => {
                if let Some(card) = self.cards.get_mut(idx) {
                    card.used = true;
                }
                true
            }
            None => false,
        }
    }

    /// Find the first unused card whose id appears in `message`.
    ///
    /// Matching is a case-insensitive substring test over unused cards in
    /// selection order. At most one card is reported per message.
    #[must_use]
    pub fn detect(&self, message: &str) -> Option<&EvidenceCard> {
        let haystack = message.to_lowercase();
        self.available()
            .find(|card| haystack.contains(&card.id.to_lowercase()))
    }

    /// Detect and spend a card in one step. Returns the spent card's id.
    pub fn consume_from_message(&mut self, message: &str) -> Option<String> {
        let id = self.detect(message)?.id.clone();
        self.use_card(&id);
        Some(id)
    }

    /// Look up a card by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&EvidenceCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Check if a card exists and has not been spent.
    #[must_use]
    pub fn is_available(&self, id: &str) -> bool {
        self.get(id).is_some_and(|c| !c.used)
    }

    /// Unused cards in selection order.
    pub fn available(&self) -> impl Iterator<Item = &EvidenceCard> {
        self.cards.iter().filter(|c| !c.used)
    }

    /// All cards in selection order.
    pub fn cards(&self) -> impl Iterator<Item = &EvidenceCard> {
        self.cards.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
