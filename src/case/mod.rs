//! Case model: the immutable premise of a match.

pub mod definition;

pub use definition::{CaseDefinition, CaseText, ClaimPoint, PointStatus};
