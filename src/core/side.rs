//! Courtroom sides and per-side storage.
//!
//! ## Side
//!
//! The two parties in a match. The prosecution is voiced by the
//! opposing-counsel agent (`Attorney`); the user argues for the
//! `Defendant`.
//!
//! ## SideMap
//!
//! Fixed two-slot storage indexed by `Side`, used for per-side scores.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two parties in a match.
///
/// Serialized as `"attorney"` / `"defendant"`, the labels the agents use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The prosecuting attorney (opposing counsel).
    Attorney,
    /// The defendant, argued by the user.
    Defendant,
}

impl Side {
    /// Both sides, prosecution first.
    pub const ALL: [Side; 2] = [Side::Attorney, Side::Defendant];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::Attorney => Side::Defendant,
            Side::Defendant => Side::Attorney,
        }
    }

    /// Slot index (attorney = 0).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::Attorney => 0,
            Side::Defendant => 1,
        }
    }

    /// Lowercase label as used in agent payloads.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Side::Attorney => "attorney",
            Side::Defendant => "defendant",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-side data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use courtroom_engine::core::{Side, SideMap};
///
/// let mut counts: SideMap<u32> = SideMap::default();
/// counts[Side::Defendant] += 2;
/// assert_eq!(counts[Side::Attorney], 0);
/// assert_eq!(counts[Side::Defendant], 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideMap<T> {
    data: [T; 2],
}

impl<T> SideMap<T> {
    /// Create a map with values from a factory function.
    pub fn new(factory: impl Fn(Side) -> T) -> Self {
        Self {
            data: [factory(Side::Attorney), factory(Side::Defendant)],
        }
    }

    /// Iterate over `(side, value)` pairs, prosecution first.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        Side::ALL.into_iter().zip(self.data.iter())
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        &self.data[side.index()]
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        &mut self.data[side.index()]
    }
}
