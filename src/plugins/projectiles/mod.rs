//! Projectiles plugin: pooled projectiles flying timed, target-tracking arcs.
//!
//! Projectiles carry no physics. A shot is decided when it is fired; the flight is
//! presentation plus a delay before the completion action runs.
//!
//! ```text
//!   frame task (shooting::fire)          Update (InGame)                 PostUpdate
//! ┌──────────────────────────────┐    ┌─────────────────────────────┐  ┌───────────────┐
//! │ BulletPool::acquire          │    │ advance_projectiles         │  │ drain frame   │
//! │ insert ProjectileMotion      │ -> │  tick -> lerp toward target │->│ tasks: run    │
//! └──────────────────────────────┘    │  arrived -> hide, enqueue   │  │ on_complete   │
//!                                     │             on_complete     │  └───────────────┘
//!                                     └─────────────────────────────┘
//! ```
//!
//! Invariants:
//! - a pooled projectile entity keeps `Projectile`, `PoolState`, `Transform` and
//!   `Visibility` for its whole life; activation only overwrites values
//! - `on_complete` is queued at most once per flight

pub mod components;
pub mod pool;

use bevy::prelude::*;

use crate::common::{state::GameState, tunables::Tunables};
use crate::plugins::dispatch::FrameTaskQueue;
use crate::plugins::spawning::{Actor, PoolState};

pub use components::{MotionStep, Projectile, ProjectileMotion};
pub use pool::BulletPool;

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::InGame), setup_bullet_pool)
            .add_systems(OnExit(GameState::GameOver), teardown_bullet_pool)
            .add_systems(Update, advance_projectiles.run_if(in_state(GameState::InGame)));
    }
}

pub fn setup_bullet_pool(mut commands: Commands, tunables: Res<Tunables>) {
    commands.insert_resource(BulletPool::new(tunables.shooting.bullet_pool_size));
}

pub fn teardown_bullet_pool(
    mut commands: Commands,
    pool: Option<ResMut<BulletPool>>,
    q_projectiles: Query<(Entity, &PoolState), With<Projectile>>,
) {
    if let Some(mut pool) = pool {
        pool.teardown(&mut commands);
    }
    for (e, state) in &q_projectiles {
        if *state == PoolState::Active {
            commands.entity(e).despawn();
        }
    }
    commands.remove_resource::<BulletPool>();
}

pub fn advance_projectiles(
    time: Res<Time>,
    queue: Res<FrameTaskQueue>,
    mut q_projectiles: Query<(&mut ProjectileMotion, &mut Transform, &mut Visibility), With<Projectile>>,
    q_targets: Query<(&Actor, &PoolState, &Transform), Without<Projectile>>,
) {
    let dt = time.delta_secs();

    for (mut motion, mut tf, mut vis) in &mut q_projectiles {
        if motion.is_done() {
            continue;
        }

        let target = motion.target();
        let target_pos = q_targets
            .get(target.entity)
            .ok()
            .filter(|(actor, state, _)| target.matches(actor, state))
            .map(|(_, _, tf)| tf.translation.truncate());

        match motion.advance(dt, target_pos) {
            MotionStep::Hold => {}
            MotionStep::Moved(pos) => {
                tf.translation.x = pos.x;
                tf.translation.y = pos.y;
            }
            MotionStep::Arrived => {
                *vis = Visibility::Hidden;
                queue.enqueue_boxed(motion.take_completion());
            }
        }
    }
}
