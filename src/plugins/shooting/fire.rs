//! Frame tasks that fire a shot and settle it.
//!
//! Both run with exclusive world access on the frame thread, possibly frames after
//! the worker decided to shoot. Anything captured may have gone stale since: the
//! shooter despawned, the target recycled under a new lease, the run torn down.
//! Stale inputs make the task a logged no-op.

use bevy::prelude::*;

use crate::common::deferred::with_resource_commands;
use crate::common::tunables::Tunables;
use crate::plugins::dispatch::FrameTask;
use crate::plugins::player::Player;
use crate::plugins::projectiles::{BulletPool, ProjectileMotion};
use crate::plugins::spawning::{ActorKind, SpawnCoordinator, TargetRef, VisibleEnemySet};

/// Fire action for one target, run later by the frame task queue.
pub fn fire_at(shooter: Entity, target: TargetRef) -> FrameTask {
    Box::new(move |world: &mut World| fire(world, shooter, target))
}

fn fire(world: &mut World, shooter: Entity, target: TargetRef) {
    let Some(origin) = world.get::<Transform>(shooter).map(|tf| tf.translation.truncate()) else {
        debug!("shooter {shooter:?} is gone; shot skipped");
        return;
    };
    if target.live_position(world).is_none() {
        debug!("target {:?} went stale before firing", target.entity);
        return;
    }
    let Some((duration, tick)) = world
        .get_resource::<Tunables>()
        .map(|t| (t.shooting.time_to_reach, t.shooting.projectile_tick))
    else {
        return;
    };

    let acquired = with_resource_commands::<BulletPool, _>(world, |commands, pool, _| pool.acquire(commands, origin));
    let Some(Some(projectile)) = acquired else {
        debug!("no projectile available; shot skipped");
        return;
    };

    let on_complete: FrameTask = Box::new(move |world: &mut World| complete_shot(world, projectile, target));
    world
        .entity_mut(projectile)
        .insert(ProjectileMotion::new(origin, target, duration, tick, on_complete));
}

/// Return the projectile and, if the target is still the one aimed at, consume it
/// and spawn a replacement enemy ahead of the player.
pub fn complete_shot(world: &mut World, projectile: Entity, target: TargetRef) {
    if let Some(Err(e)) =
        with_resource_commands::<BulletPool, _>(world, |commands, pool, _| pool.release(commands, projectile))
    {
        warn!("projectile {projectile:?} returned twice: {e}");
    }

    if target.live_position(world).is_none() {
        debug!("target {:?} went stale in flight", target.entity);
        return;
    }

    let player_y = world
        .query_filtered::<&Transform, With<Player>>()
        .iter(world)
        .next()
        .map(|tf| tf.translation.y)
        .unwrap_or_default();

    if let Some(mut visible) = world.get_resource_mut::<VisibleEnemySet>() {
        visible.remove(target.entity);
    }

    with_resource_commands::<SpawnCoordinator, _>(world, |commands, coordinator, _| {
        match coordinator.release(commands, ActorKind::Enemy, target.entity) {
            Ok(()) => {
                coordinator.spawn(commands, ActorKind::Enemy, player_y);
            }
            Err(e) => warn!("shot enemy {:?} was not checked out: {e}", target.entity),
        }
    });
}
