//! Spawn coordinator: two pools of actors laid out on lanes.
//!
//! Enemies and obstacles each get an [`ActorSpawner`]: a pool of entities, a lane
//! cursor, the fixed lane X coordinates and the spacing rules. The coordinator owns
//! both plus the RNG and the lease counter that stamps every handed-out actor.
//!
//! Pooled entities are never despawned while the run lasts. Deactivation is a value
//! change (hidden, `PoolState::Inactive`, empty collision filters), not a structural one.

use avian2d::prelude::*;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::layers::{dormant_layers, Layer};
use crate::common::tunables::{ConfigError, LaneTunables, Tunables};

use super::components::{Actor, ActorKind, InView, PoolState, Shape};
use super::lanes::{LaneCursor, LaneSpacing};
use super::pool::{PoolError, PooledAllocator, Released};

#[inline]
fn membership(kind: ActorKind) -> Layer {
    match kind {
        ActorKind::Enemy => Layer::Enemy,
        ActorKind::Obstacle => Layer::Obstacle,
    }
}

#[inline]
fn active_layers(kind: ActorKind) -> CollisionLayers {
    CollisionLayers::new(membership(kind), [Layer::Player])
}

#[inline]
fn actor_size(kind: ActorKind) -> Vec2 {
    match kind {
        ActorKind::Enemy => Vec2::splat(40.0),
        ActorKind::Obstacle => Vec2::new(120.0, 20.0),
    }
}

/// Everything a freshly built, parked actor carries.
fn dormant_actor(kind: ActorKind) -> impl Bundle {
    let size = actor_size(kind);
    (
        Name::new(format!("{}(Pooled)", kind.label())),
        Actor { kind, shape: Shape::default(), lease: 0 },
        PoolState::Inactive,
        InView(false),
        Sprite::from_color(Shape::default().color(), size),
        Transform::default(),
        Visibility::Hidden,
        RigidBody::Static,
        Collider::rectangle(size.x, size.y),
        Sensor,
        dormant_layers(membership(kind)),
    )
}

/// Pool, lanes and spacing for one actor kind.
#[derive(Debug)]
pub struct ActorSpawner {
    kind: ActorKind,
    pool: PooledAllocator<Entity>,
    lanes: LaneCursor,
    lanes_x: Vec<f32>,
    spacing: LaneSpacing,
}

impl ActorSpawner {
    pub fn new(kind: ActorKind, tunables: &LaneTunables, start_y: f32) -> Result<Self, ConfigError> {
        if tunables.lanes_x.is_empty() {
            return Err(ConfigError::EmptyLanes(kind.label()));
        }
        Ok(Self {
            kind,
            pool: PooledAllocator::new(tunables.capacity()),
            lanes: LaneCursor::new(tunables.lanes_x.len(), start_y),
            lanes_x: tunables.lanes_x.clone(),
            spacing: LaneSpacing::from_tunables(tunables)?,
        })
    }

    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    pub fn pool(&self) -> &PooledAllocator<Entity> {
        &self.pool
    }

    pub fn lanes(&self) -> &LaneCursor {
        &self.lanes
    }

    pub fn lanes_x(&self) -> &[f32] {
        &self.lanes_x
    }
}

#[derive(Resource, Debug)]
pub struct SpawnCoordinator {
    enemies: ActorSpawner,
    obstacles: ActorSpawner,
    rng: StdRng,
    next_lease: u32,
}

impl SpawnCoordinator {
    pub fn from_tunables(tunables: &Tunables, start_y: f32) -> Result<Self, ConfigError> {
        let rng = match tunables.spawn_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            enemies: ActorSpawner::new(ActorKind::Enemy, &tunables.enemies, start_y)?,
            obstacles: ActorSpawner::new(ActorKind::Obstacle, &tunables.obstacles, start_y)?,
            rng,
            next_lease: 0,
        })
    }

    pub fn spawner(&self, kind: ActorKind) -> &ActorSpawner {
        match kind {
            ActorKind::Enemy => &self.enemies,
            ActorKind::Obstacle => &self.obstacles,
        }
    }

    fn spawner_mut(&mut self, kind: ActorKind) -> &mut ActorSpawner {
        match kind {
            ActorKind::Enemy => &mut self.enemies,
            ActorKind::Obstacle => &mut self.obstacles,
        }
    }

    /// Fill both pools before the first frame. Returns how many actors were placed.
    pub fn populate(&mut self, commands: &mut Commands, player_y: f32) -> usize {
        let mut placed = 0;
        for kind in [ActorKind::Enemy, ActorKind::Obstacle] {
            for _ in 0..self.spawner(kind).pool.capacity() {
                placed += usize::from(self.spawn(commands, kind, player_y).is_some());
            }
        }
        info!("populated {placed} actors");
        placed
    }

    /// Place one actor of `kind` on a random lane ahead of the player.
    ///
    /// Returns `None` when the pool is exhausted; nothing is spawned then.
    pub fn spawn(&mut self, commands: &mut Commands, kind: ActorKind, player_y: f32) -> Option<Entity> {
        self.next_lease = self.next_lease.wrapping_add(1);
        let lease = self.next_lease;
        let Self { enemies, obstacles, rng, .. } = self;
        let spawner = match kind {
            ActorKind::Enemy => enemies,
            ActorKind::Obstacle => obstacles,
        };

        let Some(entity) = spawner.pool.acquire_with(|| commands.spawn(dormant_actor(kind)).id()) else {
            debug!("{} pool exhausted; spawn skipped", kind.label());
            return None;
        };

        let lane = rng.gen_range(0..spawner.lanes.lanes());
        let y = spawner.lanes.advance(lane, player_y, &spawner.spacing, rng);
        let x = spawner.lanes_x[lane];
        let shape = Shape::random(rng);

        commands.entity(entity).insert((
            Actor { kind, shape, lease },
            PoolState::Active,
            InView(false),
            Sprite::from_color(shape.color(), actor_size(kind)),
            Transform::from_xyz(x, y, 1.0),
            Visibility::Visible,
            active_layers(kind),
        ));

        Some(entity)
    }

    /// Hand an actor back to its pool.
    pub fn release(&mut self, commands: &mut Commands, kind: ActorKind, entity: Entity) -> Result<(), PoolError> {
        match self.spawner_mut(kind).pool.release(entity)? {
            Released::Pooled => {
                commands.entity(entity).insert((
                    PoolState::Inactive,
                    InView(false),
                    Visibility::Hidden,
                    dormant_layers(membership(kind)),
                ));
            }
            Released::Discarded(e) => {
                commands.entity(e).despawn();
            }
        }
        Ok(())
    }

    /// Destroy every parked actor and forget pool bookkeeping.
    pub fn teardown(&mut self, commands: &mut Commands) {
        for kind in [ActorKind::Enemy, ActorKind::Obstacle] {
            for e in self.spawner_mut(kind).pool.clear() {
                commands.entity(e).despawn();
            }
        }
    }
}
