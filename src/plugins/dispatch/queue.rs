//! Frame task queue: producers on any thread, one consumer on the frame thread.
//!
//! # Lock discipline
//! One mutex guards the deque. Every operation takes it for a single short critical
//! section; tasks themselves run with the lock released, which is what lets a task
//! enqueue follow-up work that the same drain pass picks up.
//!
//! # Cancellation
//! A [`CancelToken`] is cancelled with [`FrameTaskQueue::revoke`], under the queue lock.
//! [`FrameTaskQueue::enqueue_unless_cancelled`] checks the token under that same lock.
//! So once `revoke` returns, nothing guarded by that token can enter the queue.
//! Tasks already queued are left alone and still run.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::prelude::*;

/// Deferred unit of work applied with exclusive world access.
pub type FrameTask = Box<dyn FnOnce(&mut World) + Send + Sync + 'static>;

/// Shared cancellation flag, cloned into whoever produces guarded work.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Thread-safe FIFO of [`FrameTask`]s. Cloning yields another handle to the same queue.
#[derive(Resource, Clone, Default)]
pub struct FrameTaskQueue {
    inner: Arc<Mutex<VecDeque<FrameTask>>>,
}

impl std::fmt::Debug for FrameTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTaskQueue").field("pending", &self.len()).finish()
    }
}

impl FrameTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<FrameTask>> {
        // A panicking task never holds the lock, so a poisoned deque is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, task: impl FnOnce(&mut World) + Send + Sync + 'static) {
        self.lock().push_back(Box::new(task));
    }

    /// Append an already boxed task. `None` is ignored.
    pub fn enqueue_boxed(&self, task: Option<FrameTask>) {
        if let Some(task) = task {
            self.lock().push_back(task);
        }
    }

    /// Append `task` unless `token` has been revoked. Returns whether it was queued.
    pub fn enqueue_unless_cancelled(
        &self,
        token: &CancelToken,
        task: impl FnOnce(&mut World) + Send + Sync + 'static,
    ) -> bool {
        let mut queue = self.lock();
        if token.is_cancelled() {
            return false;
        }
        queue.push_back(Box::new(task));
        true
    }

    /// Cancel `token`. After this returns no task guarded by it can be enqueued.
    pub fn revoke(&self, token: &CancelToken) {
        let _queue = self.lock();
        token.cancel();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run queued tasks in FIFO order until the queue is empty, including tasks
    /// enqueued while draining. Returns how many ran.
    pub fn drain_once(&self, world: &mut World) -> usize {
        let mut ran = 0;
        loop {
            let next = self.lock().pop_front();
            let Some(task) = next else {
                return ran;
            };
            task(world);
            ran += 1;
        }
    }
}
