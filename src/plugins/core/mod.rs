//! Core plugin: shared resources and global settings.
//!
//! `Tunables` inserted before this plugin (e.g. loaded from RON) are kept.

use crate::common::tunables::Tunables;
use bevy::prelude::*;

pub fn plugin(app: &mut App) {
    if !app.world().contains_resource::<Tunables>() {
        app.insert_resource(Tunables::default());
    }
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));
}
