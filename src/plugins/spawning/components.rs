use bevy::prelude::*;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Enemy,
    Obstacle,
}

impl ActorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Enemy => "Enemy",
            Self::Obstacle => "Obstacle",
        }
    }
}

/// The visual attribute the player has to match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Shape {
    #[default]
    Circle,
    Square,
    Triangle,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Circle, Shape::Square, Shape::Triangle];

    /// Next shape in cycling order, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn color(self) -> Color {
        match self {
            Self::Circle => Color::srgb(0.95, 0.35, 0.35),
            Self::Square => Color::srgb(0.35, 0.8, 0.45),
            Self::Triangle => Color::srgb(0.35, 0.55, 0.95),
        }
    }
}

/// A pooled enemy or obstacle.
///
/// `lease` changes every time the entity is handed out by its pool, so a handle
/// captured earlier can tell whether it still points at the same "life".
#[derive(Component, Debug, Clone, Copy)]
pub struct Actor {
    pub kind: ActorKind,
    pub shape: Shape,
    pub lease: u32,
}

/// Pool lifecycle of an entity. Shared by actors and projectiles.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoolState {
    #[default]
    Inactive,
    Active,
}

/// Last visibility reported for an actor. Signals fire on transitions only.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InView(pub bool);

/// Handle to one life of a pooled actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetRef {
    pub entity: Entity,
    pub lease: u32,
}

impl TargetRef {
    pub fn new(entity: Entity, actor: &Actor) -> Self {
        Self { entity, lease: actor.lease }
    }

    /// True while the entity is checked out under the same lease.
    #[inline]
    pub fn matches(&self, actor: &Actor, state: &PoolState) -> bool {
        actor.lease == self.lease && *state == PoolState::Active
    }

    /// Current position, or `None` if the handle went stale.
    pub fn live_position(&self, world: &World) -> Option<Vec2> {
        let entity = world.get_entity(self.entity).ok()?;
        let actor = entity.get::<Actor>()?;
        let state = entity.get::<PoolState>()?;
        if !self.matches(actor, state) {
            return None;
        }
        entity.get::<Transform>().map(|tf| tf.translation.truncate())
    }
}
