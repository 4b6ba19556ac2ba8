//! Lane runner: pooled actors, lane spawning, paced multi-target shooting.
//!
//! The binary only calls [`game::run`]. Everything else lives in the library so
//! integration tests in `tests/` can build a headless app from the same plugins.

pub mod common;
pub mod game;
pub mod plugins;
