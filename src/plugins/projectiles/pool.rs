use bevy::prelude::*;

use crate::plugins::spawning::pool::{PoolError, PooledAllocator, Released};
use crate::plugins::spawning::PoolState;

use super::components::Projectile;

const PROJECTILE_Z: f32 = 2.0;

/// Bounded pool of projectile entities, built lazily on first use.
#[derive(Resource, Debug)]
pub struct BulletPool {
    allocator: PooledAllocator<Entity>,
}

fn dormant_projectile() -> impl Bundle {
    (
        Name::new("Projectile(Pooled)"),
        Projectile,
        PoolState::Inactive,
        Sprite::from_color(Color::srgb(1.0, 0.85, 0.3), Vec2::splat(8.0)),
        Transform::from_xyz(0.0, 0.0, PROJECTILE_Z),
        Visibility::Hidden,
    )
}

impl BulletPool {
    pub fn new(capacity: usize) -> Self {
        Self { allocator: PooledAllocator::new(capacity) }
    }

    pub fn allocator(&self) -> &PooledAllocator<Entity> {
        &self.allocator
    }

    /// Activate a projectile at `origin` (no structural toggles once built).
    pub fn acquire(&mut self, commands: &mut Commands, origin: Vec2) -> Option<Entity> {
        let e = self.allocator.acquire_with(|| commands.spawn(dormant_projectile()).id())?;

        commands.entity(e).insert((
            PoolState::Active,
            Transform::from_translation(origin.extend(PROJECTILE_Z)),
            Visibility::Visible,
        ));

        Some(e)
    }

    pub fn release(&mut self, commands: &mut Commands, e: Entity) -> Result<(), PoolError> {
        match self.allocator.release(e)? {
            Released::Pooled => {
                commands.entity(e).insert((PoolState::Inactive, Visibility::Hidden));
            }
            Released::Discarded(e) => {
                commands.entity(e).despawn();
            }
        }
        Ok(())
    }

    /// Despawn parked projectiles. In-flight ones are the caller's to despawn.
    pub fn teardown(&mut self, commands: &mut Commands) {
        for e in self.allocator.clear() {
            commands.entity(e).despawn();
        }
    }
}
