//! Scoring plugin: hazard collisions, game over, high score and restart.
//!
//! ```text
//! CollisionStart (avian) ──► detect_hazard_collisions ──► GameOver message
//!                                 │  high score read/write   Time<Virtual> paused
//!                                 └─► NextState(GameOver)
//! GameOver + Space ──► NextState(InGame) ──► OnExit(GameOver): unpause, pools torn down
//! ```

pub mod store;

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::plugins::player::{self, Attributes, Player};
use crate::plugins::spawning::{Actor, ActorKind, PoolState, Shape};

pub use store::{MemoryScoreStore, RonScoreStore, ScoreStore, StoreError};

/// Persistence backend for the best score.
#[derive(Resource)]
pub struct HighScores(pub Box<dyn ScoreStore>);

impl Default for HighScores {
    fn default() -> Self {
        Self(Box::new(MemoryScoreStore::default()))
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver {
    pub score: i32,
    pub high_score: i32,
}

pub fn plugin(app: &mut App) {
    if !app.world().contains_resource::<HighScores>() {
        app.init_resource::<HighScores>();
    }
    app.add_message::<GameOver>()
        .add_systems(
            Update,
            detect_hazard_collisions.run_if(in_state(GameState::InGame)),
        )
        .add_systems(Update, restart_on_input.run_if(in_state(GameState::GameOver)))
        .add_systems(OnExit(GameState::GameOver), resume_time);
}

/// Enemies always kill; obstacles kill unless their shape matches the lower attribute.
/// Parked actors never do.
#[inline]
pub fn is_fatal(actor: &Actor, state: PoolState, lower: Shape) -> bool {
    if state != PoolState::Active {
        return false;
    }
    match actor.kind {
        ActorKind::Enemy => true,
        ActorKind::Obstacle => actor.shape != lower,
    }
}

/// Record `score` and return the best score after it.
pub fn record_score(store: &mut dyn ScoreStore, score: i32) -> i32 {
    let best = store.high_score().unwrap_or_else(|e| {
        warn!("could not read high score: {e}");
        0
    });
    if score <= best {
        return best;
    }
    if let Err(e) = store.set_high_score(score) {
        warn!("could not save high score: {e}");
    }
    score
}

pub fn detect_hazard_collisions(
    mut collisions: MessageReader<CollisionStart>,
    q_player: Query<(Entity, &Attributes, &Transform), With<Player>>,
    q_actors: Query<(&Actor, &PoolState)>,
    mut scores: ResMut<HighScores>,
    mut game_over: MessageWriter<GameOver>,
    mut time: ResMut<Time<Virtual>>,
    mut next: ResMut<NextState<GameState>>,
) {
    let Ok((player, attributes, tf)) = q_player.single() else {
        collisions.clear();
        return;
    };

    let hit = collisions.read().any(|ev| {
        let other = if ev.collider1 == player || ev.body1 == Some(player) {
            ev.collider2
        } else if ev.collider2 == player || ev.body2 == Some(player) {
            ev.collider1
        } else {
            return false;
        };
        q_actors
            .get(other)
            .is_ok_and(|(actor, state)| is_fatal(actor, *state, attributes.lower))
    });
    // Anything unread after a hit belongs to the run that just ended.
    collisions.clear();
    if !hit {
        return;
    }

    let score = player::score(tf.translation.y);
    let high_score = record_score(scores.0.as_mut(), score);
    info!("game over: score {score}, best {high_score}");

    game_over.write(GameOver { score, high_score });
    time.pause();
    next.set(GameState::GameOver);
}

pub fn restart_on_input(keys: Option<Res<ButtonInput<KeyCode>>>, mut next: ResMut<NextState<GameState>>) {
    if keys.is_some_and(|k| k.just_pressed(KeyCode::Space)) {
        next.set(GameState::InGame);
    }
}

pub fn resume_time(mut time: ResMut<Time<Virtual>>) {
    time.unpause();
}
