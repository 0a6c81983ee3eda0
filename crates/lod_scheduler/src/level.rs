//! Level-of-detail enumeration and traversal helpers.
//!
//! Levels are ordered best fidelity first:
//!
//! ```text
//!   index:     0          1          2
//!           ┌───────┐  ┌───────┐  ┌───────┐
//!           │ HiRes │─►│ LoRes │─►│ Hint  │      best_to_fastest
//!           └───────┘  └───────┘  └───────┘
//!           finer ◄──────────────────► coarser
//! ```
//!
//! An object does not have to define every level. `LevelSet` records which
//! levels have a data pipeline and every traversal goes through it, so
//! undefined levels are skipped everywhere.

use std::fmt;

/// One of the interchangeable representations of a visual object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LevelOfDetail {
  /// Full fidelity, most expensive.
  HiRes,
  /// Reduced fidelity fallback.
  LoRes,
  /// Cheapest placeholder (bounding box, outline).
  Hint,
}

impl LevelOfDetail {
  /// Number of levels.
  pub const COUNT: usize = 3;

  /// All levels, best to fastest.
  pub const ALL: [LevelOfDetail; Self::COUNT] =
    [LevelOfDetail::HiRes, LevelOfDetail::LoRes, LevelOfDetail::Hint];

  /// Array index of this level (0 = best).
  #[inline]
  pub const fn index(self) -> usize {
    self as usize
  }

  /// Level at the given index, if any.
  #[inline]
  pub fn from_index(index: usize) -> Option<Self> {
    Self::ALL.get(index).copied()
  }

  /// The next more detailed level, ignoring whether it is defined.
  #[inline]
  pub fn finer(self) -> Option<Self> {
    self.index().checked_sub(1).and_then(Self::from_index)
  }

  /// The next cheaper level, ignoring whether it is defined.
  #[inline]
  pub fn coarser(self) -> Option<Self> {
    Self::from_index(self.index() + 1)
  }

  /// Short human-readable name.
  pub const fn label(self) -> &'static str {
    match self {
      LevelOfDetail::HiRes => "hi-res",
      LevelOfDetail::LoRes => "lo-res",
      LevelOfDetail::Hint => "hint",
    }
  }
}

impl fmt::Display for LevelOfDetail {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Compact set of levels (bit i = level with index i).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LevelSet(u8);

impl LevelSet {
  /// No levels.
  pub const EMPTY: LevelSet = LevelSet(0);

  /// Every level.
  pub const ALL: LevelSet = LevelSet((1 << LevelOfDetail::COUNT) - 1);

  #[inline]
  const fn bit(level: LevelOfDetail) -> u8 {
    1 << level.index()
  }

  /// Add a level.
  #[inline]
  pub fn insert(&mut self, level: LevelOfDetail) {
    self.0 |= Self::bit(level);
  }

  /// Remove a level.
  #[inline]
  pub fn remove(&mut self, level: LevelOfDetail) {
    self.0 &= !Self::bit(level);
  }

  #[inline]
  pub fn contains(self, level: LevelOfDetail) -> bool {
    self.0 & Self::bit(level) != 0
  }

  #[inline]
  pub fn is_empty(self) -> bool {
    self.0 == 0
  }

  #[inline]
  pub fn len(self) -> usize {
    self.0.count_ones() as usize
  }

  /// Most detailed level in the set.
  pub fn best(self) -> Option<LevelOfDetail> {
    self.best_to_fastest().next()
  }

  /// Cheapest level in the set.
  pub fn fastest(self) -> Option<LevelOfDetail> {
    self.fastest_to_best().next()
  }

  /// Closest level in the set that is cheaper than `from`.
  pub fn next_coarser(self, from: LevelOfDetail) -> Option<LevelOfDetail> {
    ((from.index() + 1)..LevelOfDetail::COUNT)
      .filter_map(LevelOfDetail::from_index)
      .find(|level| self.contains(*level))
  }

  /// Closest level in the set that is more detailed than `from`.
  pub fn next_finer(self, from: LevelOfDetail) -> Option<LevelOfDetail> {
    (0..from.index())
      .rev()
      .filter_map(LevelOfDetail::from_index)
      .find(|level| self.contains(*level))
  }

  /// Levels in the set, best first.
  pub fn best_to_fastest(self) -> impl Iterator<Item = LevelOfDetail> {
    LevelOfDetail::ALL
      .into_iter()
      .filter(move |level| self.contains(*level))
  }

  /// Levels in the set, cheapest first.
  pub fn fastest_to_best(self) -> impl Iterator<Item = LevelOfDetail> {
    LevelOfDetail::ALL
      .into_iter()
      .rev()
      .filter(move |level| self.contains(*level))
  }
}

impl FromIterator<LevelOfDetail> for LevelSet {
  fn from_iter<I: IntoIterator<Item = LevelOfDetail>>(iter: I) -> Self {
    let mut set = LevelSet::EMPTY;
    for level in iter {
      set.insert(level);
    }
    set
  }
}

impl fmt::Debug for LevelSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.best_to_fastest()).finish()
  }
}

#[cfg(test)]
#[path = "level_test.rs"]
mod level_test;
