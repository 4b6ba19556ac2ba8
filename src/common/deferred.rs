//! Issue `Commands` from code that only holds `&mut World`.
//!
//! Pools and the spawner are written against `Commands` so regular systems can
//! drive them. Frame tasks run with exclusive world access instead; this bridges
//! the two by pulling the resource out, recording commands into a local queue
//! and applying it before returning.

use bevy::ecs::world::CommandQueue;
use bevy::prelude::*;

/// Run `f` with `Commands` and the resource `R` taken out of the world.
///
/// Returns `None` when `R` does not exist (e.g. the run was torn down).
pub fn with_resource_commands<R: Resource, T>(
    world: &mut World,
    f: impl FnOnce(&mut Commands, &mut R, &World) -> T,
) -> Option<T> {
    if !world.contains_resource::<R>() {
        return None;
    }

    let out = world.resource_scope(|world, mut res: Mut<R>| {
        let mut queue = CommandQueue::default();
        let out = {
            let mut commands = Commands::new(&mut queue, world);
            f(&mut commands, &mut res, world)
        };
        queue.apply(world);
        out
    });
    Some(out)
}
