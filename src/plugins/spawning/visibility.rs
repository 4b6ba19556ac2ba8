//! Visibility tracking for pooled actors.
//!
//! `detect_visibility_changes` plays the part of a renderer's culling callback: it
//! compares every active actor against the view band around the player and writes a
//! [`VisibilitySignal`] on transitions only. `apply_visibility_signals` turns those
//! into bookkeeping:
//!
//! - enemy enters view: tracked in [`VisibleEnemySet`] (shot candidates)
//! - enemy leaves view: untracked, never replaced
//! - obstacle leaves view: released and a fresh obstacle spawned ahead

use bevy::prelude::*;
use indexmap::IndexSet;

use crate::common::tunables::Tunables;
use crate::plugins::player::Player;

use super::components::{Actor, ActorKind, InView, PoolState};
use super::coordinator::SpawnCoordinator;

/// Enemies currently on screen, in the order they appeared.
#[derive(Resource, Default, Debug)]
pub struct VisibleEnemySet(IndexSet<Entity>);

impl VisibleEnemySet {
    /// Returns `false` if the entity was already tracked.
    pub fn insert(&mut self, entity: Entity) -> bool {
        self.0.insert(entity)
    }

    /// Keeps the remaining insertion order.
    pub fn remove(&mut self, entity: Entity) -> bool {
        self.0.shift_remove(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilitySignal {
    pub entity: Entity,
    pub visible: bool,
}

pub fn detect_visibility_changes(
    tunables: Res<Tunables>,
    q_player: Query<&Transform, With<Player>>,
    mut q_actors: Query<(Entity, &Transform, &PoolState, &mut InView), (With<Actor>, Without<Player>)>,
    mut signals: MessageWriter<VisibilitySignal>,
) {
    let Ok(player_tf) = q_player.single() else {
        return;
    };
    let player_y = player_tf.translation.y;

    for (entity, tf, state, mut in_view) in &mut q_actors {
        if *state != PoolState::Active {
            continue;
        }
        let visible = tunables.view.contains(player_y, tf.translation.y);
        if visible != in_view.0 {
            in_view.0 = visible;
            signals.write(VisibilitySignal { entity, visible });
        }
    }
}

pub fn apply_visibility_signals(
    mut commands: Commands,
    mut signals: MessageReader<VisibilitySignal>,
    coordinator: Option<ResMut<SpawnCoordinator>>,
    mut visible: ResMut<VisibleEnemySet>,
    q_actors: Query<(&Actor, &PoolState)>,
    q_player: Query<&Transform, With<Player>>,
) {
    let Some(mut coordinator) = coordinator else {
        signals.clear();
        return;
    };
    let player_y = q_player.single().map(|tf| tf.translation.y).unwrap_or_default();

    for signal in signals.read() {
        let Ok((actor, state)) = q_actors.get(signal.entity) else {
            continue;
        };
        // Released between detection and now.
        if *state != PoolState::Active {
            continue;
        }

        match (actor.kind, signal.visible) {
            (ActorKind::Enemy, true) => {
                visible.insert(signal.entity);
            }
            (ActorKind::Enemy, false) => {
                visible.remove(signal.entity);
            }
            (ActorKind::Obstacle, true) => {}
            (ActorKind::Obstacle, false) => {
                if let Err(e) = coordinator.release(&mut commands, ActorKind::Obstacle, signal.entity) {
                    warn!("obstacle {:?} left view but was not checked out: {e}", signal.entity);
                    continue;
                }
                coordinator.spawn(&mut commands, ActorKind::Obstacle, player_y);
            }
        }
    }
}
