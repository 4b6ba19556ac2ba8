//! Spawning plugin: pooled enemies and obstacles placed on procedural lanes.
//!
//! # Data flow
//! ```text
//!  OnEnter(InGame)                Update (InGame)
//! ┌────────────────────┐        ┌──────────────────────────────────────────┐
//! │ setup_run          │        │ detect_visibility_changes                │
//! │  build coordinator │        │   view band vs. actor Y, transitions     │
//! │  populate at y=0   │        │        │ VisibilitySignal                │
//! └────────────────────┘        │        v                                 │
//!                               │ apply_visibility_signals                 │
//!  OnExit(GameOver)             │   enemy in/out  -> VisibleEnemySet       │
//! ┌────────────────────┐        │   obstacle out  -> release + spawn       │
//! │ teardown_run       │        └──────────────────────────────────────────┘
//! └────────────────────┘
//! ```
//!
//! Enemies are consumed by shots (see `shooting::fire`); obstacles recycle
//! themselves once they fall behind the player.
//!
//! The coordinator lives from `OnEnter(InGame)` until the finished run is left, so a
//! frame task that outlives the run finds no coordinator and does nothing.

pub mod components;
pub mod coordinator;
pub mod lanes;
pub mod pool;
pub mod visibility;

use bevy::prelude::*;

use crate::common::{state::GameState, tunables::Tunables};

pub use components::{Actor, ActorKind, InView, PoolState, Shape, TargetRef};
pub use coordinator::SpawnCoordinator;
pub use visibility::{VisibilitySignal, VisibleEnemySet};

/// Y the player starts each run at.
pub const RUN_START_Y: f32 = 0.0;

pub fn plugin(app: &mut App) {
    app.init_resource::<VisibleEnemySet>()
        .add_message::<VisibilitySignal>()
        .add_systems(OnEnter(GameState::InGame), setup_run)
        .add_systems(OnExit(GameState::GameOver), teardown_run)
        .add_systems(
            Update,
            (
                visibility::detect_visibility_changes,
                visibility::apply_visibility_signals,
            )
                .chain()
                .run_if(in_state(GameState::InGame)),
        );
}

/// Build the coordinator and fill both pools ahead of the player.
pub fn setup_run(mut commands: Commands, tunables: Res<Tunables>) {
    let mut coordinator = match SpawnCoordinator::from_tunables(&tunables, RUN_START_Y) {
        Ok(c) => c,
        Err(e) => {
            error!("spawner disabled: {e}");
            return;
        }
    };
    coordinator.populate(&mut commands, RUN_START_Y);
    commands.insert_resource(coordinator);
}

/// Forget the finished run: parked actors go through the coordinator, checked-out
/// ones are despawned directly.
pub fn teardown_run(
    mut commands: Commands,
    coordinator: Option<ResMut<SpawnCoordinator>>,
    mut visible: ResMut<VisibleEnemySet>,
    q_actors: Query<(Entity, &PoolState), With<Actor>>,
) {
    if let Some(mut coordinator) = coordinator {
        coordinator.teardown(&mut commands);
    }
    for (entity, state) in &q_actors {
        if *state == PoolState::Active {
            commands.entity(entity).despawn();
        }
    }
    visible.clear();
    commands.remove_resource::<SpawnCoordinator>();
    debug!("run torn down");
}

#[cfg(test)]
mod tests;
