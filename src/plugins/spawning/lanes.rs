//! Per-lane spawn offsets.
//!
//! Each lane remembers the Y of its last spawn. Asking for the next spawn moves the
//! lane forward by a random gap, and keeps moving it while a percent roll stays at or
//! below `spawn_probability`. A higher probability therefore means *more* skipped
//! slots and sparser lanes. The comparison direction is deliberate; do not flip it.

use rand::Rng;

use crate::common::tunables::{ConfigError, LaneTunables, SpawnRange, MAX_SPAWN_PROBABILITY};

/// Validated spacing parameters for one actor kind.
///
/// Only constructible through [`LaneSpacing::new`], so ranges are finite and
/// ordered and the probability always lets the reject-loop terminate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneSpacing {
    initial: SpawnRange,
    step: SpawnRange,
    spawn_probability: u8,
}

impl LaneSpacing {
    pub fn new(initial: SpawnRange, step: SpawnRange, spawn_probability: u8) -> Result<Self, ConfigError> {
        if spawn_probability > MAX_SPAWN_PROBABILITY {
            return Err(ConfigError::SpawnProbability(spawn_probability));
        }
        initial.validate("initial_delta")?;
        step.validate("step_delta")?;
        Ok(Self { initial, step, spawn_probability })
    }

    pub fn initial(&self) -> SpawnRange {
        self.initial
    }

    pub fn step(&self) -> SpawnRange {
        self.step
    }

    pub fn spawn_probability(&self) -> u8 {
        self.spawn_probability
    }

    pub fn from_tunables(t: &LaneTunables) -> Result<Self, ConfigError> {
        Self::new(t.initial_delta, t.step_delta, t.spawn_probability)
    }
}

/// Uniform sample in `[min, max]`. A degenerate or non-finite range yields `min`.
#[inline]
pub fn sample(range: SpawnRange, rng: &mut impl Rng) -> f32 {
    if !(range.min.is_finite() && range.max.is_finite()) || range.min >= range.max {
        range.min
    } else {
        rng.gen_range(range.min..=range.max)
    }
}

/// Offset of the next spawn in a lane currently at `current`.
pub fn next_offset(current: f32, player_y: f32, spacing: &LaneSpacing, rng: &mut impl Rng) -> f32 {
    debug_assert!(spacing.spawn_probability <= MAX_SPAWN_PROBABILITY);
    let mut offset = current;
    loop {
        offset = if offset <= player_y {
            player_y + sample(spacing.initial, rng)
        } else {
            offset + sample(spacing.step, rng)
        };

        if rng.gen_range(1..=100u8) > spacing.spawn_probability {
            return offset;
        }
    }
}

/// Offsets of every lane of one actor kind.
#[derive(Debug, Clone)]
pub struct LaneCursor {
    offsets: Vec<f32>,
}

impl LaneCursor {
    /// All lanes start level with `start_y`, so their first spawn reseeds.
    pub fn new(lanes: usize, start_y: f32) -> Self {
        Self { offsets: vec![start_y; lanes] }
    }

    #[inline]
    pub fn lanes(&self) -> usize {
        self.offsets.len()
    }

    pub fn offset(&self, lane: usize) -> Option<f32> {
        self.offsets.get(lane).copied()
    }

    /// Move `lane` to its next spawn offset and return it.
    ///
    /// # Panics
    /// Panics if `lane` is out of range.
    pub fn advance(&mut self, lane: usize, player_y: f32, spacing: &LaneSpacing, rng: &mut impl Rng) -> f32 {
        let slot = &mut self.offsets[lane];
        *slot = next_offset(*slot, player_y, spacing, rng);
        *slot
    }
}
