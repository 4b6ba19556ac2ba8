use bevy::prelude::*;

use crate::plugins::dispatch::FrameTask;
use crate::plugins::spawning::TargetRef;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Projectile;

/// Result of advancing a projectile by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionStep {
    /// Nothing to apply: no whole tick elapsed, or the target went stale.
    Hold,
    Moved(Vec2),
    /// Flight time is over. Reported once.
    Arrived,
}

/// Timed flight toward a live target, sampled at a fixed tick.
///
/// The flight takes `duration` rounded up to whole ticks. Each tick moves the
/// projectile to `lerp(origin, target, ticks / total_ticks)` using the target's
/// position at that tick, so a moving target is tracked.
#[derive(Component)]
pub struct ProjectileMotion {
    origin: Vec2,
    target: TargetRef,
    tick: f32,
    total_ticks: u32,
    ticks: u32,
    accumulator: f32,
    done: bool,
    on_complete: Option<FrameTask>,
}

impl ProjectileMotion {
    /// Smallest sampling interval accepted; a zero tick would never advance.
    pub const MIN_TICK: f32 = 1.0e-3;

    pub fn new(origin: Vec2, target: TargetRef, duration: f32, tick: f32, on_complete: FrameTask) -> Self {
        let tick = tick.max(Self::MIN_TICK);
        // Tolerance so 0.35 / 0.05 counts as 7 ticks, not 8.
        let total_ticks = ((duration / tick) - 1.0e-4).ceil().max(1.0) as u32;
        Self {
            origin,
            target,
            tick,
            total_ticks,
            ticks: 0,
            accumulator: 0.0,
            done: false,
            on_complete: Some(on_complete),
        }
    }

    #[inline]
    pub fn target(&self) -> TargetRef {
        self.target
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn total_ticks(&self) -> u32 {
        self.total_ticks
    }

    /// Advance by `dt` seconds. `target_pos` is `None` when the target is stale;
    /// the projectile then holds still but still arrives on schedule.
    pub fn advance(&mut self, dt: f32, target_pos: Option<Vec2>) -> MotionStep {
        if self.done {
            return MotionStep::Hold;
        }

        self.accumulator += dt;
        let mut step = MotionStep::Hold;
        while self.accumulator >= self.tick {
            self.accumulator -= self.tick;
            self.ticks += 1;
            if self.ticks >= self.total_ticks {
                self.done = true;
                return MotionStep::Arrived;
            }
            if let Some(target) = target_pos {
                let fraction = self.ticks as f32 / self.total_ticks as f32;
                step = MotionStep::Moved(self.origin.lerp(target, fraction));
            }
        }
        step
    }

    /// Completion action, handed out at most once.
    pub fn take_completion(&mut self) -> Option<FrameTask> {
        self.on_complete.take()
    }
}
