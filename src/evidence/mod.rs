//! Evidence registry: one-time-use claim cards.

pub mod registry;

pub use registry::{EvidenceCard, EvidenceRegistry};
