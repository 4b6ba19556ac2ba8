//! Dispatch plugin: hand work computed off the frame thread back to the frame thread.
//!
//! ```text
//!  worker thread(s)                       frame thread (PostUpdate)
//! ┌──────────────────────┐   enqueue    ┌────────────────────────────┐
//! │ ShotWorker, tests, … │ ───────────► │ drain_frame_tasks          │
//! └──────────────────────┘   (mutex)    │   while let Some(t) = pop  │
//!                                       │       t(&mut World)        │
//!                                       └────────────────────────────┘
//! ```
//!
//! The queue resource is inserted once and lives as long as the `App`; it is not
//! tied to any `GameState`.

pub mod queue;

use bevy::prelude::*;

pub use queue::{CancelToken, FrameTask, FrameTaskQueue};

pub fn plugin(app: &mut App) {
    if !app.world().contains_resource::<FrameTaskQueue>() {
        app.insert_resource(FrameTaskQueue::new());
    }
    app.add_systems(PostUpdate, drain_frame_tasks);
}

/// Exclusive system: apply every pending frame task.
pub fn drain_frame_tasks(world: &mut World) {
    let queue = world.resource::<FrameTaskQueue>().clone();
    let ran = queue.drain_once(world);
    if ran > 0 {
        trace!("drained {ran} frame tasks");
    }
}
