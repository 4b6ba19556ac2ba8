//! Bounded object pool with lazy construction.
//!
//! The allocator only does bookkeeping: which instances are parked, which are
//! handed out, and how many may exist at once. Building, activating and destroying
//! instances is the caller's job, because for entities that needs `Commands`.
//!
//! Invariant: `checked_out + inactive <= capacity`.

use std::hash::Hash;

use bevy::platform::collections::HashSet;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Double release, or an instance this pool never handed out.
    #[error("instance is not checked out of this pool")]
    NotCheckedOut,
}

/// Outcome of a successful release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released<T> {
    /// Parked for reuse; the caller should deactivate it.
    Pooled,
    /// Pool already full; the caller should destroy it.
    Discarded(T),
}

#[derive(Debug)]
pub struct PooledAllocator<T> {
    inactive: Vec<T>,
    checked_out: HashSet<T>,
    capacity: usize,
}

impl<T: Copy + Eq + Hash> PooledAllocator<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inactive: Vec::with_capacity(capacity),
            checked_out: HashSet::default(),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.checked_out.len()
    }

    #[inline]
    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    #[inline]
    fn total(&self) -> usize {
        self.inactive.len() + self.checked_out.len()
    }

    pub fn is_checked_out(&self, item: T) -> bool {
        self.checked_out.contains(&item)
    }

    /// Hand out a parked instance, or build one with `create` if there is room.
    ///
    /// `None` means the pool is exhausted; `create` is not called in that case.
    pub fn acquire_with(&mut self, create: impl FnOnce() -> T) -> Option<T> {
        let item = match self.inactive.pop() {
            Some(item) => item,
            None if self.total() < self.capacity => create(),
            None => return None,
        };
        self.checked_out.insert(item);
        Some(item)
    }

    pub fn release(&mut self, item: T) -> Result<Released<T>, PoolError> {
        if !self.checked_out.remove(&item) {
            return Err(PoolError::NotCheckedOut);
        }
        if self.total() >= self.capacity {
            return Ok(Released::Discarded(item));
        }
        self.inactive.push(item);
        Ok(Released::Pooled)
    }

    /// Change the capacity. Parked instances above the new limit are returned for destruction;
    /// checked-out instances over the limit get discarded as they come back.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<T> {
        self.capacity = capacity;
        let keep = capacity.saturating_sub(self.checked_out.len()).min(self.inactive.len());
        self.inactive.split_off(keep)
    }

    /// Forget all bookkeeping and return the parked instances for destruction.
    /// Instances still checked out are not reclaimed.
    pub fn clear(&mut self) -> Vec<T> {
        self.checked_out.clear();
        std::mem::take(&mut self.inactive)
    }
}
