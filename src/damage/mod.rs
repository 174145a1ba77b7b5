//! Damage resolver: ordered HP deltas and KO detection.

pub mod resolver;

pub use resolver::{DamageOutcome, DamageResolver, DamageRoll, KoCheck};
