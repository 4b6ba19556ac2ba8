//! Shot sessions: the frame-thread half of the shot sequencer.
//!
//! ```text
//!  start_session(attr)          tick() until lag elapsed           worker thread
//!  ─────────────────►  Lagging  ───────────────────────► Staging ──► Firing(0..n) ──► Idle
//!        │                                                               │
//!        └─ revokes the previous session's token ──────────────────────►  Cancelled
//! ```
//!
//! A new session always supersedes the previous one. The old token is revoked
//! through the queue lock before `start_session` returns, so no fire action of the
//! old session can be queued afterwards; actions it already queued still run.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bevy::prelude::*;

use crate::common::tunables::ShotTunables;
use crate::plugins::dispatch::{CancelToken, FrameTaskQueue};
use crate::plugins::spawning::{Shape, TargetRef};

use super::worker::{FireFn, ShotWorker, StagingJob};
use super::ShootingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Lagging,
    Staging,
    /// Index into the filtered target list of the shot being fired.
    Firing(usize),
    Cancelled,
}

/// One entry of the staged snapshot: who to shoot and what they look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCandidate {
    pub target: TargetRef,
    pub shape: Shape,
}

#[derive(Debug)]
struct SessionStatus {
    id: SessionId,
    phase: SessionPhase,
}

/// Phase of the newest session, written by both threads.
#[derive(Debug, Clone)]
pub struct SharedStatus(Arc<Mutex<SessionStatus>>);

impl SharedStatus {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(SessionStatus { id: SessionId(0), phase: SessionPhase::Idle })))
    }

    fn lock(&self) -> MutexGuard<'_, SessionStatus> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, id: SessionId) {
        *self.lock() = SessionStatus { id, phase: SessionPhase::Lagging };
    }

    /// Update the phase unless a newer session has started since.
    pub(crate) fn set_if_current(&self, id: SessionId, phase: SessionPhase) {
        let mut status = self.lock();
        if status.id == id {
            status.phase = phase;
        }
    }

    fn phase(&self) -> SessionPhase {
        self.lock().phase
    }
}

#[derive(Debug)]
struct ActiveSession {
    id: SessionId,
    token: CancelToken,
    attribute: Shape,
    lag: Timer,
    staged: bool,
}

/// Paced multi-target shooter, attached to the entity that shoots.
#[derive(Component, Debug)]
pub struct ShotSequencer {
    lag: Duration,
    queue: FrameTaskQueue,
    status: SharedStatus,
    next_id: u64,
    session: Option<ActiveSession>,
    worker: ShotWorker,
}

impl ShotSequencer {
    pub fn new(queue: FrameTaskQueue, tunables: &ShotTunables) -> Result<Self, ShootingError> {
        Self::with_fire(queue, tunables, super::fire::fire_at)
    }

    /// Like [`ShotSequencer::new`], with a custom fire action builder.
    pub fn with_fire(queue: FrameTaskQueue, tunables: &ShotTunables, fire: FireFn) -> Result<Self, ShootingError> {
        tunables.validate()?;
        let status = SharedStatus::new();
        let interval = Duration::from_secs_f32(tunables.time_between_shots.max(0.0));
        let worker = ShotWorker::spawn(queue.clone(), status.clone(), interval, fire)?;
        Ok(Self {
            lag: Duration::from_secs_f32(tunables.lag_before_shooting.max(0.0)),
            queue,
            status,
            next_id: 0,
            session: None,
            worker,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.status.phase()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Supersede whatever is running and start lagging toward a shot at `attribute`.
    pub fn start_session(&mut self, attribute: Shape) -> SessionId {
        self.stop_current();

        self.next_id += 1;
        let id = SessionId(self.next_id);
        self.status.begin(id);
        self.session = Some(ActiveSession {
            id,
            token: CancelToken::new(),
            attribute,
            lag: Timer::new(self.lag, TimerMode::Once),
            staged: false,
        });
        debug!("shot session {} started for {attribute:?}", id.0);
        id
    }

    /// Advance the lag timer. When it elapses, `candidates` is called once to
    /// snapshot the visible targets and the job moves to the worker.
    pub fn tick(&mut self, dt: Duration, shooter: Entity, candidates: impl FnOnce() -> Vec<TargetCandidate>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.staged {
            return;
        }

        session.lag.tick(dt);
        if !session.lag.is_finished() {
            return;
        }

        session.staged = true;
        self.status.set_if_current(session.id, SessionPhase::Staging);
        self.worker.stage(StagingJob {
            id: session.id,
            token: session.token.clone(),
            attribute: session.attribute,
            shooter,
            candidates: candidates(),
        });
    }

    /// Stop the current session without starting another.
    pub fn cancel(&mut self) {
        if let Some(id) = self.stop_current() {
            self.status.set_if_current(id, SessionPhase::Cancelled);
        }
    }

    fn stop_current(&mut self) -> Option<SessionId> {
        let session = self.session.take()?;
        self.queue.revoke(&session.token);
        if session.staged {
            self.worker.cancel();
        }
        Some(session.id)
    }
}

impl Drop for ShotSequencer {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            self.queue.revoke(&session.token);
        }
    }
}
