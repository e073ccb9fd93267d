// SPDX-License-Identifier: MIT

//! Task record: policy, state, cancellation, and statistics for one
//! registered task.

use crate::policy::TaskPolicy;
use crate::state::{TaskState, TerminationCause};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Instant;

/// Per-task counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    pub context_switches: u64,
    pub work_cycles: u64,
}

/// Signal used by [`crate::lifecycle::LifecycleEngine::join`] to block until
/// a task reaches `Terminated`.
#[derive(Clone, Default)]
pub struct JoinSignal(Arc<(Mutex<bool>, Condvar)>);

impl JoinSignal {
    pub fn new() -> Self {
        Self(Arc::new((Mutex::new(false), Condvar::new())))
    }

    pub fn signal(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock() = true;
        cvar.notify_all();
    }

    pub fn wait(&self) {
        let (lock, cvar) = &*self.0;
        let mut done = lock.lock();
        while !*done {
            cvar.wait(&mut done);
        }
    }
}

/// A registered task: policy, state, cancellation, and statistics.
/// `policy.parent_id` and `policy.daemon_mode` are the two fields the
/// Destruction Policy Engine may mutate post-registration.
#[derive(Clone)]
pub struct TaskRecord {
    pub policy: TaskPolicy,
    pub state: TaskState,
    /// Set by `request_graceful`/`request_immediate`; observed by the worker
    /// loop at its next checkpoint.
    pub cancel_flag: bool,
    /// True only for `request_immediate` — the worker should not wait for a
    /// cooperative checkpoint.
    pub force_cancel: bool,
    pub stats: TaskStats,
    pub generation_depth: u8,
    pub creation_time: Instant,
    pub last_heartbeat: Instant,
    pub termination: Option<TerminationCause>,
    pub join_signal: JoinSignal,
}

impl TaskRecord {
    pub fn new(policy: TaskPolicy, generation_depth: u8, now: Instant) -> Self {
        Self {
            policy,
            state: TaskState::New,
            cancel_flag: false,
            force_cancel: false,
            stats: TaskStats::default(),
            generation_depth,
            creation_time: now,
            last_heartbeat: now,
            termination: None,
            join_signal: JoinSignal::new(),
        }
    }

    pub fn is_runnable_for_token_ops(&self) -> bool {
        matches!(self.state, TaskState::Running | TaskState::New)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
