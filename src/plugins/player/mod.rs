//! Player plugin.
//!
//! Pipeline:
//! - Update: sample keys, write `AttributeChange` messages
//! - Update: move forward at the current speed, ramp speed per distance milestone
//!
//! Headless apps have no `ButtonInput`; they drive the player by writing
//! `AttributeChange` messages directly.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::{
    layers::Layer,
    state::GameState,
    tunables::{RunTunables, Tunables},
};
use crate::plugins::spawning::{Shape, RUN_START_Y};

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// The two shapes the player shows. `upper` picks shot targets, `lower` must
/// match obstacles.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attributes {
    pub upper: Shape,
    pub lower: Shape,
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ForwardMotion {
    pub speed: f32,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeChange {
    Upper,
    Lower,
}

pub fn plugin(app: &mut App) {
    app.add_message::<AttributeChange>()
        .add_systems(OnEnter(GameState::InGame), spawn_player)
        .add_systems(
            Update,
            (gather_input, move_forward).run_if(in_state(GameState::InGame)),
        );
}

pub fn spawn_player(mut commands: Commands, tunables: Res<Tunables>) {
    let layers = CollisionLayers::new(Layer::Player, [Layer::Enemy, Layer::Obstacle]);

    commands.spawn((
        Name::new("Player"),
        Player,
        Attributes::default(),
        ForwardMotion { speed: tunables.run.move_speed },
        Sprite::from_color(Shape::default().color(), Vec2::splat(26.0)),
        Transform::from_xyz(0.0, RUN_START_Y, 1.0),
        // Dynamic so sensor overlaps with static actors are reported; motion is
        // written to the transform, never integrated.
        RigidBody::Dynamic,
        GravityScale(0.0),
        LockedAxes::ROTATION_LOCKED,
        Collider::circle(13.0),
        layers,
        CollisionEventsEnabled,
        DespawnOnExit(GameState::GameOver),
    ));
}

pub fn gather_input(keys: Option<Res<ButtonInput<KeyCode>>>, mut changes: MessageWriter<AttributeChange>) {
    let Some(keys) = keys else {
        return;
    };

    if keys.any_just_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        changes.write(AttributeChange::Upper);
    }
    if keys.any_just_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        changes.write(AttributeChange::Lower);
    }
}

/// Speed after reaching `y`. Bumps once per distance milestone the speed has not
/// caught up with yet, and stops bumping at `max_speed`.
pub fn ramped_speed(speed: f32, y: f32, run: &RunTunables) -> f32 {
    if run.speed_threshold_y <= 0.0 || run.speed_increase <= 0.0 {
        return speed;
    }
    let milestone = (y / run.speed_threshold_y).floor();
    let bumps = ((speed - run.move_speed) / run.speed_increase).floor();
    if milestone != bumps && speed < run.max_speed {
        speed + run.speed_increase
    } else {
        speed
    }
}

/// Distance travelled, in whole units.
#[inline]
pub fn score(y: f32) -> i32 {
    y as i32
}

pub fn move_forward(
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut q_player: Query<(&mut Transform, &mut ForwardMotion), With<Player>>,
) {
    let dt = time.delta_secs();
    for (mut tf, mut motion) in &mut q_player {
        tf.translation.y += motion.speed * dt;
        motion.speed = ramped_speed(motion.speed, tf.translation.y, &tunables.run);
    }
}
