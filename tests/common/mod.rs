//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `lane_runner::game::configure_headless` to install gameplay plugins.
//! - time advances by a fixed step per `update()` so runs are reproducible.

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use lane_runner::common::tunables::Tunables;

pub const FRAME: Duration = Duration::from_millis(50);

pub fn app_headless() -> App {
    app_headless_with(Tunables { spawn_seed: Some(1), ..default() })
}

pub fn app_headless_with(tunables: Tunables) -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app.insert_resource(tunables);

    lane_runner::game::configure_headless(&mut app);
    // `App::run` normally does this; tests drive `update()` directly.
    app.finish();
    app.cleanup();
    app
}

/// Run frames until `cond` holds, sleeping briefly so worker threads can progress.
pub fn update_until(app: &mut App, max_frames: usize, mut cond: impl FnMut(&mut World) -> bool) -> bool {
    for _ in 0..max_frames {
        app.update();
        if cond(app.world_mut()) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}
