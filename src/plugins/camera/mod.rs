//! Camera plugin (render only).
//!
//! A system cannot hold `Query<&Transform>` and `Query<&mut Transform>` at once
//! unless Bevy can prove the queries disjoint, so both carry `Without<...>` filters.
//!
//! ```text
//! Startup:    spawn MainCamera (lives for the whole app, across runs)
//! PostUpdate: follow_player eases toward the player's Y, keeps a look-ahead
//! ```

use bevy::prelude::*;

use crate::common::tunables::{CAMERA_LOOK_AHEAD, CAMERA_RESPONSIVENESS};
use crate::plugins::player::Player;

#[derive(Component)]
pub struct MainCamera {
    pub responsiveness: f32,
    /// How far above the player the camera centres; the runner looks ahead.
    pub look_ahead: f32,
}

pub fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_camera)
        .add_systems(PostUpdate, follow_player.before(TransformSystems::Propagate));
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera { responsiveness: CAMERA_RESPONSIVENESS, look_ahead: CAMERA_LOOK_AHEAD },
        Transform::from_xyz(0.0, 0.0, 999.0),
    ));
}

fn follow_player(
    time: Res<Time>,
    q_player: Query<&Transform, (With<Player>, Without<MainCamera>)>,
    mut q_cam: Query<(&mut Transform, &MainCamera), Without<Player>>,
) {
    let (Ok(tf_player), Ok((mut tf_cam, cam))) = (q_player.single(), q_cam.single_mut()) else {
        return;
    };

    let dt = time.delta_secs();
    let alpha = 1.0 - (-cam.responsiveness * dt).exp();
    let goal = tf_player.translation.y + cam.look_ahead;

    tf_cam.translation.y += (goal - tf_cam.translation.y) * alpha;
}
