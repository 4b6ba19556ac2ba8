//! Collision layers.

use avian2d::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    Player,
    Enemy,
    Obstacle,
}

/// Layers for a pooled actor that is out of play: keeps membership, filters nothing.
#[inline]
pub fn dormant_layers(membership: Layer) -> CollisionLayers {
    CollisionLayers::new(membership, [] as [Layer; 0])
}
