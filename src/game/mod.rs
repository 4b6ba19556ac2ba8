//! Game composition root.
//!
//! Provides two public configuration functions:
//! - `configure_full`: DefaultPlugins (window/render), tunables from disk, file-backed high score.
//! - `configure_headless`: minimal configuration for integration tests.

use std::io::ErrorKind;

use bevy::prelude::*;
use bevy::window::WindowResolution;

use crate::common::state::GameState;
use crate::common::tunables::{ConfigError, Tunables, VIEW_HEIGHT, VIEW_WIDTH};
use crate::plugins;
use crate::plugins::scoring::{HighScores, RonScoreStore};

// Only compile these imports on Windows.
// This avoids unused-import / missing-module issues on Linux.
#[cfg(target_os = "windows")]
use bevy::render::{
    settings::{Backends, PowerPreference, WgpuSettings},
    RenderPlugin,
};

/// Optional overrides, relative to the working directory.
pub const TUNABLES_PATH: &str = "tunables.ron";
pub const HIGH_SCORE_PATH: &str = "high_score.ron";

pub fn run() {
    App::new().add_plugins(configure_full).run();
}

/// Full configuration for `cargo run`.
pub fn configure_full(app: &mut App) {
    let default_plugins = DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Lane Runner".into(),
            resolution: WindowResolution::new(VIEW_WIDTH, VIEW_HEIGHT),
            ..default()
        }),
        ..default()
    });

    // Vulkan is unreliable on some Windows drivers; force DX12 on a high-performance adapter.
    #[cfg(target_os = "windows")]
    let default_plugins = default_plugins.set(RenderPlugin {
        render_creation: WgpuSettings {
            backends: Some(Backends::DX12),
            power_preference: PowerPreference::HighPerformance,
            ..default()
        }
        .into(),
        ..default()
    });

    // LogPlugin is part of DefaultPlugins; load config afterwards so failures are logged.
    app.add_plugins(default_plugins);

    app.insert_resource(load_tunables(TUNABLES_PATH))
        .insert_resource(HighScores(Box::new(RonScoreStore::new(HIGH_SCORE_PATH))));

    configure_game(app);
    plugins::register_render(app);
}

/// Headless configuration for integration tests.
///
/// Notes:
/// - Do NOT add DefaultPlugins.
/// - Do NOT add render-only plugins (camera).
/// - High scores stay in memory.
pub fn configure_headless(app: &mut App) {
    configure_game(app);
}

/// Configuration shared by both full and headless apps.
fn configure_game(app: &mut App) {
    app.init_state::<GameState>();
    plugins::register_gameplay(app);
}

/// Tunables from `path`, or defaults when the file is absent or invalid.
pub fn load_tunables(path: &str) -> Tunables {
    match Tunables::load_ron(path) {
        Ok(tunables) => {
            info!("loaded tunables from {path}");
            tunables
        }
        Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => Tunables::default(),
        Err(e) => {
            warn!("ignoring {path}: {e}");
            Tunables::default()
        }
    }
}
