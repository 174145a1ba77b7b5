//! Core engine types: sides, health, messages, match state, configuration, errors.
//!
//! Every other module builds on these. A match is an explicit `MatchState`
//! value; nothing here is global.

pub mod side;
pub mod config;
pub mod error;
pub mod state;

pub use side::{Side, SideMap};
pub use config::{DamagePolicy, MatchConfig};
pub use error::{AgentError, EngineError, Result, ValidationError};
pub use state::{HealthState, MatchState, Message, Outcome, Phase, Sender};
