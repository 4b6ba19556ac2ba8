//! Shot worker: one background thread per sequencer.
//!
//! The thread owns nothing from the ECS. It receives a staged job (an immutable
//! snapshot of candidates), filters it, and paces fire actions into the
//! [`FrameTaskQueue`]. Every wait is a `recv_timeout` on the job channel, so a new
//! job, a cancel or a shutdown interrupts it immediately.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use bevy::prelude::*;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::plugins::dispatch::{CancelToken, FrameTask, FrameTaskQueue};
use crate::plugins::spawning::{Shape, TargetRef};

use super::session::{SessionId, SessionPhase, SharedStatus, TargetCandidate};
use super::ShootingError;

/// Builds the frame task that fires one shot.
pub type FireFn = fn(Entity, TargetRef) -> FrameTask;

/// Everything the worker needs to run one session's firing phase.
#[derive(Debug)]
pub struct StagingJob {
    pub id: SessionId,
    pub token: CancelToken,
    pub attribute: Shape,
    pub shooter: Entity,
    pub candidates: Vec<TargetCandidate>,
}

#[derive(Debug)]
pub enum WorkerMsg {
    Stage(StagingJob),
    Cancel,
    Shutdown,
}

enum JobEnd {
    Done,
    Cancelled,
    Superseded(StagingJob),
    Shutdown,
}

struct WorkerContext {
    queue: FrameTaskQueue,
    status: SharedStatus,
    interval: Duration,
    fire: FireFn,
}

impl WorkerContext {
    fn set_phase(&self, id: SessionId, phase: SessionPhase) {
        self.status.set_if_current(id, phase);
    }
}

/// Handle to the worker thread. Dropping it shuts the thread down and joins it.
#[derive(Debug)]
pub struct ShotWorker {
    tx: Sender<WorkerMsg>,
    handle: Option<JoinHandle<()>>,
}

impl ShotWorker {
    pub fn spawn(
        queue: FrameTaskQueue,
        status: SharedStatus,
        interval: Duration,
        fire: FireFn,
    ) -> Result<Self, ShootingError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let ctx = WorkerContext { queue, status, interval, fire };

        let handle = thread::Builder::new()
            .name("shot-worker".into())
            .spawn(move || run(rx, ctx))
            .map_err(ShootingError::WorkerSpawn)?;

        Ok(Self { tx, handle: Some(handle) })
    }

    pub fn stage(&self, job: StagingJob) {
        if self.tx.send(WorkerMsg::Stage(job)).is_err() {
            warn!("shot worker is gone; staged job dropped");
        }
    }

    /// Interrupt the current job, if any.
    pub fn cancel(&self) {
        let _ = self.tx.send(WorkerMsg::Cancel);
    }
}

impl Drop for ShotWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(WorkerMsg::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("shot worker panicked");
            }
        }
    }
}

fn run(rx: Receiver<WorkerMsg>, ctx: WorkerContext) {
    let mut pending: Option<StagingJob> = None;
    loop {
        let job = match pending.take() {
            Some(job) => job,
            None => match rx.recv() {
                Ok(WorkerMsg::Stage(job)) => job,
                // Nothing in flight to interrupt.
                Ok(WorkerMsg::Cancel) => continue,
                Ok(WorkerMsg::Shutdown) | Err(_) => return,
            },
        };

        match fire_job(&rx, &ctx, job) {
            JobEnd::Done | JobEnd::Cancelled => {}
            JobEnd::Superseded(next) => pending = Some(next),
            JobEnd::Shutdown => return,
        }
    }
}

fn fire_job(rx: &Receiver<WorkerMsg>, ctx: &WorkerContext, job: StagingJob) -> JobEnd {
    ctx.set_phase(job.id, SessionPhase::Staging);

    let targets: Vec<TargetRef> = job
        .candidates
        .iter()
        .filter(|c| c.shape == job.attribute)
        .map(|c| c.target)
        .collect();

    for (i, target) in targets.iter().copied().enumerate() {
        ctx.set_phase(job.id, SessionPhase::Firing(i));
        let task = (ctx.fire)(job.shooter, target);
        if !ctx.queue.enqueue_unless_cancelled(&job.token, task) {
            ctx.set_phase(job.id, SessionPhase::Cancelled);
            return JobEnd::Cancelled;
        }

        if i + 1 == targets.len() {
            break;
        }

        match rx.recv_timeout(ctx.interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(WorkerMsg::Cancel) => {
                ctx.set_phase(job.id, SessionPhase::Cancelled);
                return JobEnd::Cancelled;
            }
            Ok(WorkerMsg::Stage(next)) => {
                ctx.set_phase(job.id, SessionPhase::Cancelled);
                return JobEnd::Superseded(next);
            }
            Ok(WorkerMsg::Shutdown) | Err(RecvTimeoutError::Disconnected) => return JobEnd::Shutdown,
        }
    }

    ctx.set_phase(job.id, SessionPhase::Idle);
    JobEnd::Done
}
