//! Feature plugins.

use bevy::prelude::*;

use crate::plugins::projectiles::ProjectilesPlugin;

pub mod core;
pub mod dispatch;
pub mod physics;
pub mod player;
pub mod projectiles;
pub mod scoring;
pub mod shooting;
pub mod spawning;

// Render-only
pub mod camera;

/// Register gameplay plugins that work in headless tests.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    dispatch::plugin(app);
    player::plugin(app);
    spawning::plugin(app);
    shooting::plugin(app);
    scoring::plugin(app);
    app.add_plugins(ProjectilesPlugin);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
}
