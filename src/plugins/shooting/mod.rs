//! Shooting plugin: paced, multi-target shots at enemies matching the player's attribute.
//!
//! # Data flow
//! ```text
//!   Update (InGame)                                   worker thread
//! ┌──────────────────────────────────────┐         ┌─────────────────────────┐
//! │ apply_attribute_changes              │         │ filter snapshot by shape│
//! │   Upper -> cycle + start_session     │         │ for each target:        │
//! │ drive_shot_sequencers                │  job    │   enqueue fire_at       │
//! │   lag elapsed -> snapshot visible    │ ──────► │   wait between shots    │
//! │   enemies (entity, lease, shape)     │         └───────────┬─────────────┘
//! └──────────────────────────────────────┘                     │ FrameTaskQueue
//!                                                              v
//!                                       PostUpdate: fire_at -> projectile flight
//!                                       -> complete_shot -> release + respawn enemy
//! ```
//!
//! The worker never touches the world. All entity mutation happens in frame tasks.

pub mod fire;
pub mod session;
pub mod worker;

use bevy::prelude::*;

use crate::common::{
    state::GameState,
    tunables::{ConfigError, Tunables},
};
use crate::plugins::dispatch::FrameTaskQueue;
use crate::plugins::player::{self, AttributeChange, Attributes, Player};
use crate::plugins::spawning::{Actor, PoolState, TargetRef, VisibleEnemySet};

pub use session::{SessionId, SessionPhase, ShotSequencer, TargetCandidate};

#[derive(thiserror::Error, Debug)]
pub enum ShootingError {
    #[error("failed to spawn shot worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("invalid shot timing: {0}")]
    Config(#[from] ConfigError),
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), arm_shooters.after(player::spawn_player))
        .add_systems(OnEnter(GameState::GameOver), cancel_shots)
        .add_systems(
            Update,
            (apply_attribute_changes, drive_shot_sequencers)
                .chain()
                .after(player::gather_input)
                .run_if(in_state(GameState::InGame)),
        );
}

/// Give every player without one a shot sequencer.
pub fn arm_shooters(
    mut commands: Commands,
    queue: Res<FrameTaskQueue>,
    tunables: Res<Tunables>,
    q_players: Query<Entity, (With<Player>, Without<ShotSequencer>)>,
) {
    for player in &q_players {
        match ShotSequencer::new(queue.clone(), &tunables.shooting) {
            Ok(sequencer) => {
                commands.entity(player).insert(sequencer);
            }
            Err(e) => error!("player {player:?} cannot shoot: {e}"),
        }
    }
}

/// A finished run fires nothing more; queued shots would take projectiles that never fly.
pub fn cancel_shots(mut q_sequencers: Query<&mut ShotSequencer>) {
    for mut sequencer in &mut q_sequencers {
        sequencer.cancel();
    }
}

pub fn apply_attribute_changes(
    mut changes: MessageReader<AttributeChange>,
    mut q_players: Query<(&mut Attributes, Option<&mut ShotSequencer>), With<Player>>,
) {
    for change in changes.read() {
        for (mut attributes, sequencer) in &mut q_players {
            match change {
                AttributeChange::Upper => {
                    attributes.upper = attributes.upper.next();
                    if let Some(mut sequencer) = sequencer {
                        sequencer.start_session(attributes.upper);
                    }
                }
                AttributeChange::Lower => {
                    attributes.lower = attributes.lower.next();
                }
            }
        }
    }
}

/// Snapshot of the visible enemies that are still checked out.
pub fn snapshot_candidates(visible: &VisibleEnemySet, q_actors: &Query<(&Actor, &PoolState)>) -> Vec<TargetCandidate> {
    visible
        .iter()
        .filter_map(|e| {
            let (actor, state) = q_actors.get(e).ok()?;
            let target = TargetRef::new(e, actor);
            target
                .matches(actor, state)
                .then_some(TargetCandidate { target, shape: actor.shape })
        })
        .collect()
}

pub fn drive_shot_sequencers(
    time: Res<Time>,
    visible: Res<VisibleEnemySet>,
    q_actors: Query<(&Actor, &PoolState)>,
    mut q_shooters: Query<(Entity, &mut ShotSequencer)>,
) {
    for (shooter, mut sequencer) in &mut q_shooters {
        sequencer.tick(time.delta(), shooter, || snapshot_candidates(&visible, &q_actors));
    }
}
