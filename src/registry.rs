// SPDX-License-Identifier: MIT

//! Task Registry: id -> [`TaskRecord`] mapping and genealogy lookup.
//!
//! Exposed behind an abstract interface with a single-writer invariant
//! rather than a global array + mutex, which permits an internal hash map
//! (as here) without an API change, and lets `children_of` grow a secondary
//! parent->children index later without callers noticing. A linear scan is
//! fine at this capacity (256 tasks).

use crate::error::GovError;
use crate::id::TaskId;
use crate::state::TaskState;
use crate::task::TaskRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Capacity of the registry.
pub const MAX_TASKS: usize = 256;
/// Maximum genealogical depth a task may be registered at.
pub const MAX_HIERARCHY_DEPTH: u8 = 8;
/// Maximum number of direct children a single parent may have.
pub const MAX_CHILDREN_PER_PROCESS: u32 = 32;

#[derive(Clone)]
struct Entry {
    record: TaskRecord,
}

pub struct Registry {
    inner: parking_lot::Mutex<HashMap<TaskId, Entry>>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self { inner: parking_lot::Mutex::new(HashMap::new()), next_id: AtomicU64::new(1) }
    }

    /// Allocate a fresh task id. Assigned before registration.
    pub fn alloc_task_id(&self) -> TaskId {
        TaskId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Compute the generation depth for a prospective child of `parent_id`.
    pub fn generation_depth_for(&self, parent_id: TaskId) -> Result<u8, GovError> {
        if parent_id.is_root() {
            return Ok(0);
        }
        let inner = self.inner.lock();
        let parent = inner.get(&parent_id).ok_or(GovError::UnknownTask(parent_id))?;
        Ok(parent.record.generation_depth + 1)
    }

    /// Enforces the hierarchy-depth and per-parent child-count limits.
    pub fn register(&self, task_id: TaskId, record: TaskRecord) -> Result<(), GovError> {
        if record.generation_depth > MAX_HIERARCHY_DEPTH {
            return Err(GovError::HierarchyDepthExceeded(MAX_HIERARCHY_DEPTH));
        }
        let mut inner = self.inner.lock();
        if inner.len() >= MAX_TASKS {
            return Err(GovError::RegistryFull);
        }
        if !record.policy.parent_id.is_root() {
            let siblings = inner
                .values()
                .filter(|e| e.record.policy.parent_id == record.policy.parent_id)
                .count() as u32;
            if siblings >= MAX_CHILDREN_PER_PROCESS {
                return Err(GovError::ChildLimitExceeded(record.policy.parent_id, MAX_CHILDREN_PER_PROCESS));
            }
        }
        inner.insert(task_id, Entry { record });
        Ok(())
    }

    pub fn exists(&self, task_id: TaskId) -> bool {
        self.inner.lock().contains_key(&task_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only access to a task record.
    pub fn with<T>(&self, task_id: TaskId, f: impl FnOnce(&TaskRecord) -> T) -> Option<T> {
        let inner = self.inner.lock();
        inner.get(&task_id).map(|e| f(&e.record))
    }

    /// Mutable access to a task record. Concurrent mutation of fields other
    /// than `state`, `last_heartbeat`, `policy.parent_id`, `policy.daemon_mode`,
    /// and `stats.context_switches` is disallowed by convention — callers
    /// are expected to honor that, this method does not police it.
    pub fn with_mut<T>(&self, task_id: TaskId, f: impl FnOnce(&mut TaskRecord) -> T) -> Option<T> {
        let mut inner = self.inner.lock();
        inner.get_mut(&task_id).map(|e| f(&mut e.record))
    }

    /// A byte-identical-enough clone for inspection outside the lock.
    pub fn snapshot(&self, task_id: TaskId) -> Option<TaskRecord> {
        self.with(task_id, |r| r.clone())
    }

    /// Advance a task's state, enforcing `TaskState::can_transition_to`.
    /// An illegal transition is a lifecycle engine bug, not a condition
    /// callers recover from, so this asserts rather than returning a
    /// `Result`. Returns the prior state, or `None` if unregistered.
    pub fn transition_state(&self, task_id: TaskId, next: TaskState) -> Option<TaskState> {
        self.with_mut(task_id, |r| {
            debug_assert!(
                r.state.can_transition_to(next),
                "illegal task state transition: {:?} -> {:?}",
                r.state,
                next
            );
            let prev = r.state;
            r.state = next;
            prev
        })
    }

    /// Every registered task id, in ascending order. Used by
    /// [`crate::runtime::Runtime::shutdown`] to drain the whole registry,
    /// not just root-level tasks.
    pub fn all_ids(&self) -> Vec<TaskId> {
        let inner = self.inner.lock();
        let mut ids: Vec<TaskId> = inner.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Direct children of `parent_id`, in ascending task-id order (the
    /// ordering the Destruction Policy Engine relies on for determinism).
    pub fn children_of(&self, parent_id: TaskId) -> Vec<TaskId> {
        let inner = self.inner.lock();
        let mut ids: Vec<TaskId> = inner
            .iter()
            .filter(|(_, e)| e.record.policy.parent_id == parent_id)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Only valid after `Terminated` and token reclaim; this method does not
    /// enforce that precondition, the Lifecycle Engine does (it is the only
    /// caller).
    pub fn unregister(&self, task_id: TaskId) {
        self.inner.lock().remove(&task_id);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
