// SPDX-License-Identifier: MIT

//! Concurrency mode and destruction policy.

use serde::{Deserialize, Serialize};

/// Execution mode for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Single-threaded cooperative scheduling.
    Simulated,
    /// One OS-level worker per task, truly concurrent.
    Parallel,
}

crate::simple_display! {
    ConcurrencyMode {
        Simulated => "simulated",
        Parallel => "parallel",
    }
}

/// Policy applied to a child when its parent is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestructionPolicy {
    /// Terminate the child immediately, with resource cleanup.
    Cascade,
    /// Orphan the child if `keep_alive`, else fall back to `Cascade`.
    KeepAlive,
    /// Signal the child; it exits at its next cooperative checkpoint.
    Graceful,
    /// Forcibly cancel with no cleanup guarantee beyond runtime-managed resources.
    Immediate,
}

crate::simple_display! {
    DestructionPolicy {
        Cascade => "cascade",
        KeepAlive => "keep_alive",
        Graceful => "graceful",
        Immediate => "immediate",
    }
}

/// Caller-supplied task configuration, immutable once registered.
///
/// `parent_id` and `daemon_mode` are the two exceptions: the Destruction
/// Policy Engine may clear/set them on the registered [`crate::task::TaskRecord`]
/// (not on this struct, which remains the original declared configuration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPolicy {
    /// Task id of parent, or [`crate::id::TaskId::ROOT`].
    pub parent_id: crate::id::TaskId,
    pub mode: ConcurrencyMode,
    pub destroy_policy: DestructionPolicy,
    /// Consulted only under `DestructionPolicy::KeepAlive`.
    pub keep_alive: bool,
    /// True if this task must survive parent orphaning.
    pub daemon_mode: bool,
    /// Whether generation-depth enforcement is active.
    pub trace_capped: bool,
    /// Terminate when genealogical depth exceeds this value (if `trace_capped`).
    pub max_trace_depth: u8,
    /// 0 = no limit; otherwise self-terminate when elapsed exceeds this.
    pub max_execution_time_ms: u64,
    /// In `Simulated` mode, whether this task must periodically yield.
    pub return_to_main_required: bool,
}

impl Default for TaskPolicy {
    fn default() -> Self {
        Self {
            parent_id: crate::id::TaskId::ROOT,
            mode: ConcurrencyMode::Simulated,
            destroy_policy: DestructionPolicy::Cascade,
            keep_alive: false,
            daemon_mode: false,
            trace_capped: false,
            max_trace_depth: 0,
            max_execution_time_ms: 0,
            return_to_main_required: true,
        }
    }
}

crate::builder! {
    pub struct TaskPolicyBuilder => TaskPolicy {
        set {
            parent_id: crate::id::TaskId = crate::id::TaskId::ROOT,
            mode: ConcurrencyMode = ConcurrencyMode::Simulated,
            destroy_policy: DestructionPolicy = DestructionPolicy::Cascade,
            keep_alive: bool = false,
            daemon_mode: bool = false,
            trace_capped: bool = false,
            max_trace_depth: u8 = 0,
            max_execution_time_ms: u64 = 0,
            return_to_main_required: bool = true,
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
