// SPDX-License-Identifier: MIT

//! Task state machine.
//!
//! `New → Running → (Yielded ↔ Running)* → Terminating → Terminated`.
//! `Terminated` is a fixed point: no transition out of it is legal.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Registered, worker not yet started.
    New,
    /// Worker actively executing.
    Running,
    /// Cooperatively suspended (Simulated mode only).
    Yielded,
    /// Termination requested, worker not yet observed it.
    Terminating,
    /// Worker returned; record retained for inspection until reaped.
    Terminated,
}

crate::simple_display! {
    TaskState {
        New => "new",
        Running => "running",
        Yielded => "yielded",
        Terminating => "terminating",
        Terminated => "terminated",
    }
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Terminated)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (New, Running)
                | (Running, Yielded)
                | (Yielded, Running)
                | (Running, Terminating)
                | (Yielded, Terminating)
                | (Terminating, Terminated)
        )
    }
}

/// Why a task reached `Terminated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationCause {
    /// The work closure returned `WorkCycleOutcome::Done` on its own.
    Natural,
    /// `max_execution_time_ms` was exceeded.
    Deadline,
    /// `generation_depth > max_trace_depth` under `trace_capped`.
    TraceCap,
    /// `request_graceful` was observed at a checkpoint.
    Graceful,
    /// `request_immediate` forced cancellation.
    Immediate,
    /// The work closure panicked.
    Fault(String),
}

crate::simple_display! {
    TerminationCause {
        Natural => "natural",
        Deadline => "deadline",
        TraceCap => "trace_cap",
        Graceful => "graceful",
        Immediate => "immediate",
        Fault(..) => "fault",
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
