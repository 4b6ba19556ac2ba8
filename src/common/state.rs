//! Global state machine.
//!
//! `InGame` owns a run: player, pools, spawner. `GameOver` freezes virtual time
//! until the run is restarted.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    InGame,
    GameOver,
}
