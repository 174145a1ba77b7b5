//! Damage resolution: applies HP deltas in a fixed order and detects KOs.
//!
//! ## Sequential policy
//!
//! 1. Attack phase: the user's damage (agent-reported damage plus any
//!    evidence bonus) hits the attorney. A KO ends the round as a win.
//! 2. Counter phase: only if the attorney is still standing, the agent's
//!    counter damage hits the defendant. A KO ends the round as a loss.
//!
//! ## Simultaneous policy
//!
//! Both damages land at once; a defendant KO takes precedence.
//!
//! Surrender never reaches the resolver.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{DamagePolicy, HealthState, MatchConfig, Side};

/// KO check after applying damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KoCheck {
    None,
    AttorneyKo,
    DefendantKo,
}

impl KoCheck {
    /// KO result for a side that just hit zero.
    #[must_use]
    pub const fn for_side(side: Side) -> Self {
        match side {
            Side::Attorney => KoCheck::AttorneyKo,
            Side::Defendant => KoCheck::DefendantKo,
        }
    }

    #[must_use]
    pub const fn is_ko(self) -> bool {
        !matches!(self, KoCheck::None)
    }
}

/// Damage values for one round, already clamped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRoll {
    /// Agent-reported damage to the attorney.
    pub attack: u32,
    /// Agent-reported damage to the defendant.
    pub counter: u32,
    /// Evidence bonus added to the attack.
    pub bonus: u32,
}

impl DamageRoll {
    /// Total damage dealt by the user.
    #[must_use]
    pub const fn user_damage(&self) -> u32 {
        self.attack + self.bonus
    }
}

/// What a round's damage resolution did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// Damage dealt to the attorney.
    pub to_attorney: u32,
    /// Damage dealt to the defendant; `None` if the counter phase was skipped.
    pub to_defendant: Option<u32>,
    pub ko: KoCheck,
}

/// Applies damage according to a match's configuration.
#[derive(Clone, Copy, Debug)]
pub struct DamageResolver {
    policy: DamagePolicy,
    max_attack: u32,
    max_counter: u32,
    default_damage: u32,
}

impl DamageResolver {
    #[must_use]
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            policy: config.damage_policy,
            max_attack: config.max_attack_damage,
            max_counter: config.max_counter_damage,
            default_damage: config.default_damage,
        }
    }

    #[must_use]
    pub fn policy(&self) -> DamagePolicy {
        self.policy
    }

    /// Clamp a raw attack value into `0..=max_attack`. Missing values use the default.
    #[must_use]
    pub fn clamp_attack(&self, raw: Option<i64>) -> u32 {
        clamp_damage(raw, self.default_damage, self.max_attack)
    }

    /// Clamp a raw counter value into `0..=max_counter`. Missing values use the default.
    #[must_use]
    pub fn clamp_counter(&self, raw: Option<i64>) -> u32 {
        clamp_damage(raw, self.default_damage, self.max_counter)
    }

    /// Lower one side's HP, stopping at zero.
    pub fn apply_damage_to_one(health: &mut HealthState, target: Side, amount: u32) -> KoCheck {
        let hp = health.damage(target, amount);
        debug!(%target, amount, hp, "damage applied");

        if hp == 0 {
            KoCheck::for_side(target)
        } else {
            KoCheck::None
        }
    }

    /// Attack phase: the user's total damage hits the attorney.
    pub fn attack_phase(health: &mut HealthState, roll: &DamageRoll) -> KoCheck {
        Self::apply_damage_to_one(health, Side::Attorney, roll.user_damage())
    }

    /// Counter phase: the agent's counter damage hits the defendant.
    pub fn counter_phase(health: &mut HealthState, roll: &DamageRoll) -> KoCheck {
        Self::apply_damage_to_one(health, Side::Defendant, roll.counter)
    }

    /// Resolve a whole round without pauses between phases.
    pub fn resolve(&self, health: &mut HealthState, roll: &DamageRoll) -> DamageOutcome {
        match self.policy {
            DamagePolicy::Sequential => {
                let ko = Self::attack_phase(health, roll);
                if ko.is_ko() {
                    return DamageOutcome {
                        to_attorney: roll.user_damage(),
                        to_defendant: None,
                        ko,
                    };
                }
                DamageOutcome {
                    to_attorney: roll.user_damage(),
                    to_defendant: Some(roll.counter),
                    ko: Self::counter_phase(health, roll),
                }
            }
            DamagePolicy::Simultaneous => {
                let attorney = Self::attack_phase(health, roll);
                let defendant = Self::counter_phase(health, roll);
                let ko = if defendant.is_ko() { defendant } else { attorney };
                DamageOutcome {
                    to_attorney: roll.user_damage(),
                    to_defendant: Some(roll.counter),
                    ko,
                }
            }
        }
    }
}

fn clamp_damage(raw: Option<i64>, default: u32, max: u32) -> u32 {
    match raw {
        Some(value) => value.clamp(0, i64::from(max)) as u32,
        None => default.min(max),
    }
}
