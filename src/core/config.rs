//! Match configuration.
//!
//! Hosts configure the engine per match by providing a `MatchConfig`.
//! Every product tuning constant lives here; the engine never hardcodes
//! HP pools, clamp bounds, or thresholds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::EngineError;

/// How a normal round's two damage values are applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamagePolicy {
    /// User damage hits the attorney first. A KO ends the round before
    /// the counter-damage phase runs.
    #[default]
    Sequential,
    /// Both damages land at once. If both sides fall, the defendant's
    /// KO decides the match.
    Simultaneous,
}

/// Complete match configuration.
///
/// ## Example
///
/// ```
/// use courtroom_engine::core::{DamagePolicy, MatchConfig};
///
/// let config = MatchConfig::default()
///     .with_max_hp(60)
///     .with_damage_policy(DamagePolicy::Simultaneous);
///
/// assert_eq!(config.max_hp, 60);
/// assert_eq!(config.evidence_bonus, 10);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Starting and maximum HP for each side.
    pub max_hp: u32,

    /// Flat bonus added to the user's damage when a card is deployed.
    pub evidence_bonus: u32,

    /// Upper clamp for `damage_to_attorney`.
    pub max_attack_damage: u32,

    /// Upper clamp for `damage_to_defendant`.
    pub max_counter_damage: u32,

    /// Damage used when the agent omits a damage field.
    pub default_damage: u32,

    /// Intensity used when the agent omits it.
    pub default_intensity: u8,

    /// From this exchange count on, suggestions always end with surrender.
    pub surrender_after_exchanges: u32,

    /// Maximum number of evidence cards selectable at setup.
    pub evidence_slots: usize,

    /// Damage application order.
    pub damage_policy: DamagePolicy,

    /// Presentation pause between damage sub-phases, in milliseconds.
    pub phase_delay_ms: u64,

    /// Per-call agent timeout. `None` waits indefinitely.
    pub agent_timeout_ms: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_hp: 100,
            evidence_bonus: 10,
            max_attack_damage: 25,
            max_counter_damage: 25,
            default_damage: 5,
            default_intensity: 3,
            surrender_after_exchanges: 6,
            evidence_slots: 3,
            damage_policy: DamagePolicy::Sequential,
            phase_delay_ms: 0,
            agent_timeout_ms: None,
        }
    }
}

impl MatchConfig {
    /// Set the HP pool.
    #[must_use]
    pub fn with_max_hp(mut self, max_hp: u32) -> Self {
        self.max_hp = max_hp;
        self
    }

    /// Set the evidence bonus.
    #[must_use]
    pub fn with_evidence_bonus(mut self, bonus: u32) -> Self {
        self.evidence_bonus = bonus;
        self
    }

    /// Set both damage clamps.
    #[must_use]
    pub fn with_damage_caps(mut self, attack: u32, counter: u32) -> Self {
        self.max_attack_damage = attack;
        self.max_counter_damage = counter;
        self
    }

    /// Set the damage policy.
    #[must_use]
    pub fn with_damage_policy(mut self, policy: DamagePolicy) -> Self {
        self.damage_policy = policy;
        self
    }

    /// Set the surrender suggestion threshold.
    #[must_use]
    pub fn with_surrender_after(mut self, exchanges: u32) -> Self {
        self.surrender_after_exchanges = exchanges;
        self
    }

    /// Set the presentation delay between damage sub-phases.
    #[must_use]
    pub fn with_phase_delay(mut self, delay: Duration) -> Self {
        self.phase_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set a per-call agent timeout.
    #[must_use]
    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Presentation delay as a `Duration`.
    #[must_use]
    pub fn phase_delay(&self) -> Duration {
        Duration::from_millis(self.phase_delay_ms)
    }

    /// Agent timeout as a `Duration`.
    #[must_use]
    pub fn agent_timeout(&self) -> Option<Duration> {
        self.agent_timeout_ms.map(Duration::from_millis)
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_hp == 0 {
            return Err(EngineError::Config("max_hp must be positive".into()));
        }
        if !(1..=10).contains(&self.default_intensity) {
            return Err(EngineError::Config(
                "default_intensity must be within 1..=10".into(),
            ));
        }
        Ok(())
    }
}
