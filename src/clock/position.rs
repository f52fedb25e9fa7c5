//! Beat position tracking
//!
//! Counts ticks and cycles the position within the fixed four-beat bar.

use crate::bpm::Bpm;
use std::fmt;

/// Beats in one bar
pub const BEATS_PER_BAR: u8 = 4;

/// Position within the bar, always in `1..=BEATS_PER_BAR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeatPosition(u8);

impl BeatPosition {
    /// First beat of the bar
    pub const DOWNBEAT: BeatPosition = BeatPosition(1);

    /// Validate a raw position.
    pub fn new(value: u8) -> Option<Self> {
        (1..=BEATS_PER_BAR)
            .contains(&value)
            .then_some(BeatPosition(value))
    }

    /// Raw position (1-based)
    pub fn get(self) -> u8 {
        self.0
    }

    /// `(position % 4) + 1`
    pub fn next(self) -> Self {
        BeatPosition((self.0 % BEATS_PER_BAR) + 1)
    }

    /// Whether this is beat 1
    pub fn is_downbeat(self) -> bool {
        self == Self::DOWNBEAT
    }

    /// Every position of the bar in order
    pub fn all() -> impl Iterator<Item = BeatPosition> {
        (1..=BEATS_PER_BAR).map(BeatPosition)
    }
}

impl fmt::Display for BeatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What handlers and subscribers receive once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatEvent {
    /// Position reached by this tick
    pub position: BeatPosition,
    /// Zero-based tick index since the clock (re)started
    pub tick: u64,
    /// Tempo the clock is running at
    pub bpm: Bpm,
}

/// Tick counter for one running period
///
/// Tick 0 lands on the downbeat; each later tick advances the position.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BeatCounter {
    ticks: u64,
    position: Option<BeatPosition>,
}

impl BeatCounter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Advance by one tick, returning the tick index and the new position
    pub(crate) fn advance(&mut self) -> (u64, BeatPosition) {
        let position = match self.position {
            None => BeatPosition::DOWNBEAT,
            Some(position) => position.next(),
        };
        let tick = self.ticks;
        self.ticks += 1;
        self.position = Some(position);
        (tick, position)
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> Option<BeatPosition> {
        self.position
    }
}
