//! Tunable gameplay constants.
//!
//! Everything here is plain data with a `Default` that plays well. A RON file can
//! override any subset of fields; missing fields fall back to the defaults.
//!
//! ```ron
//! (
//!     run: (move_speed: 300.0),
//!     enemies: (lanes_x: [-200.0, 200.0], spawn_probability: 30),
//!     spawn_seed: Some(7),
//! )
//! ```

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Highest spawn probability that still lets the lane reject-loop terminate.
pub const MAX_SPAWN_PROBABILITY: u8 = 99;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("spawn probability {0} never lets the lane cursor settle (max 99)")]
    SpawnProbability(u8),

    #[error("{0} lane set has no lanes")]
    EmptyLanes(&'static str),

    #[error("{0} must be a finite number")]
    NonFinite(&'static str),

    #[error("{0} has min above max")]
    InvertedRange(&'static str),
}

/// `Err(NonFinite(field))` unless `value` is finite.
pub fn ensure_finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() { Ok(()) } else { Err(ConfigError::NonFinite(field)) }
}

/// Inclusive `[min, max]` range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRange {
    pub min: f32,
    pub max: f32,
}

impl SpawnRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Both bounds finite and `min <= max`.
    pub fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        ensure_finite(field, self.min)?;
        ensure_finite(field, self.max)?;
        if self.min > self.max {
            return Err(ConfigError::InvertedRange(field));
        }
        Ok(())
    }
}

/// Forward motion and speed ramp of the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunTunables {
    pub move_speed: f32,
    /// Distance travelled between two speed increases.
    pub speed_threshold_y: f32,
    pub speed_increase: f32,
    pub max_speed: f32,
}

impl RunTunables {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("run.move_speed", self.move_speed)?;
        ensure_finite("run.speed_threshold_y", self.speed_threshold_y)?;
        ensure_finite("run.speed_increase", self.speed_increase)?;
        ensure_finite("run.max_speed", self.max_speed)
    }
}

impl Default for RunTunables {
    fn default() -> Self {
        Self { move_speed: 240.0, speed_threshold_y: 1500.0, speed_increase: 40.0, max_speed: 480.0 }
    }
}

/// Window size in logical pixels.
pub const VIEW_WIDTH: u32 = 720;
pub const VIEW_HEIGHT: u32 = 1280;
/// Camera centre above the player.
pub const CAMERA_LOOK_AHEAD: f32 = 200.0;
/// Easing rate of the camera toward its goal, per second.
pub const CAMERA_RESPONSIVENESS: f32 = 5.0;
/// Slack beyond the visible area. Must exceed the camera's trail at top speed.
pub const VIEW_MARGIN: f32 = 120.0;

/// Vertical band around the player that counts as "on screen".
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewBand {
    pub above: f32,
    pub below: f32,
}

impl Default for ViewBand {
    fn default() -> Self {
        Self::around_camera(VIEW_HEIGHT as f32, CAMERA_LOOK_AHEAD, VIEW_MARGIN)
    }
}

impl ViewBand {
    /// Band seen by a camera `view_height` tall centred `look_ahead` above the player,
    /// widened by `margin` on both sides.
    pub fn around_camera(view_height: f32, look_ahead: f32, margin: f32) -> Self {
        let half = view_height / 2.0;
        Self { above: half + look_ahead + margin, below: half - look_ahead + margin }
    }

    #[inline]
    pub fn contains(&self, player_y: f32, y: f32) -> bool {
        y >= player_y - self.below && y <= player_y + self.above
    }
}

/// Lane layout and spacing for one actor kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneTunables {
    pub lanes_x: Vec<f32>,
    pub pool_size_per_lane: usize,
    /// Gap above the player when a lane has fallen behind.
    pub initial_delta: SpawnRange,
    /// Gap between consecutive spawns in one lane.
    pub step_delta: SpawnRange,
    /// Percent chance of re-rolling once more. Higher means sparser lanes.
    pub spawn_probability: u8,
}

impl LaneTunables {
    pub fn capacity(&self) -> usize {
        self.pool_size_per_lane * self.lanes_x.len()
    }

    fn enemies() -> Self {
        Self {
            lanes_x: vec![-200.0, 0.0, 200.0],
            pool_size_per_lane: 3,
            initial_delta: SpawnRange::new(420.0, 720.0),
            step_delta: SpawnRange::new(220.0, 380.0),
            spawn_probability: 40,
        }
    }

    fn obstacles() -> Self {
        Self {
            lanes_x: vec![-100.0, 100.0],
            pool_size_per_lane: 3,
            initial_delta: SpawnRange::new(360.0, 640.0),
            step_delta: SpawnRange::new(260.0, 420.0),
            spawn_probability: 35,
        }
    }
}

impl Default for LaneTunables {
    fn default() -> Self {
        Self::enemies()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotTunables {
    /// Delay between an attribute change and target selection, seconds.
    pub lag_before_shooting: f32,
    /// Delay between two consecutive shots of one session, seconds.
    pub time_between_shots: f32,
    pub bullet_pool_size: usize,
    /// Flight time of one projectile, seconds.
    pub time_to_reach: f32,
    /// Sampling interval of projectile motion, seconds.
    pub projectile_tick: f32,
}

impl ShotTunables {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("shooting.lag_before_shooting", self.lag_before_shooting)?;
        ensure_finite("shooting.time_between_shots", self.time_between_shots)?;
        ensure_finite("shooting.time_to_reach", self.time_to_reach)?;
        ensure_finite("shooting.projectile_tick", self.projectile_tick)
    }
}

impl Default for ShotTunables {
    fn default() -> Self {
        Self {
            lag_before_shooting: 0.3,
            time_between_shots: 0.15,
            bullet_pool_size: 16,
            time_to_reach: 0.35,
            projectile_tick: 0.05,
        }
    }
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub run: RunTunables,
    pub view: ViewBand,
    pub enemies: LaneTunables,
    pub obstacles: LaneTunables,
    pub shooting: ShotTunables,
    /// Fixed seed for lane placement and shapes. `None` seeds from entropy.
    pub spawn_seed: Option<u64>,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            run: RunTunables::default(),
            view: ViewBand::default(),
            enemies: LaneTunables::enemies(),
            obstacles: LaneTunables::obstacles(),
            shooting: ShotTunables::default(),
            spawn_seed: None,
        }
    }
}

impl Tunables {
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let tunables: Self = ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        tunables.validate()?;
        Ok(tunables)
    }

    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("pixels_per_meter", self.pixels_per_meter)?;
        ensure_finite("view.above", self.view.above)?;
        ensure_finite("view.below", self.view.below)?;
        self.run.validate()?;
        self.shooting.validate()?;
        for (name, lanes) in [("Enemy", &self.enemies), ("Obstacle", &self.obstacles)] {
            if lanes.lanes_x.is_empty() {
                return Err(ConfigError::EmptyLanes(name));
            }
            if lanes.spawn_probability > MAX_SPAWN_PROBABILITY {
                return Err(ConfigError::SpawnProbability(lanes.spawn_probability));
            }
            if lanes.lanes_x.iter().any(|x| !x.is_finite()) {
                return Err(ConfigError::NonFinite("lanes_x"));
            }
            lanes.initial_delta.validate("initial_delta")?;
            lanes.step_delta.validate("step_delta")?;
        }
        Ok(())
    }
}
