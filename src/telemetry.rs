// SPDX-License-Identifier: MIT

//! Structured telemetry: observable side effects of governance decisions.
//!
//! Every lifecycle transition, token operation, and context-switch decision
//! produces one [`TelemetryEvent`]. Within a single task its own events are
//! totally ordered; across tasks only causally related events are ordered —
//! this module does not itself enforce that, it only defines the record and
//! the sink trait; ordering falls out of the Registry/Pool locking
//! discipline that produces the events serially.

use crate::id::{TaskId, TokenId};
use crate::state::TerminationCause;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    TaskRegistered,
    TaskRunning,
    TaskYielded,
    TaskTerminating,
    TaskTerminated,
    TokenAcquired,
    TokenReleased,
    TokenTransferred,
    ContextSwitchOk,
    ContextSwitchDenied,
    ChildDestroyed,
}

crate::simple_display! {
    EventKind {
        TaskRegistered => "task:registered",
        TaskRunning => "task:running",
        TaskYielded => "task:yielded",
        TaskTerminating => "task:terminating",
        TaskTerminated => "task:terminated",
        TokenAcquired => "token:acquired",
        TokenReleased => "token:released",
        TokenTransferred => "token:transferred",
        ContextSwitchOk => "context_switch:ok",
        ContextSwitchDenied => "context_switch:denied",
        ChildDestroyed => "child:destroyed",
    }
}

/// One structured telemetry record.
#[derive(Debug, Clone)]
pub struct TelemetryEvent {
    pub timestamp: Instant,
    pub kind: EventKind,
    pub task_id: TaskId,
    /// Token id for token operations, the other task id for a context
    /// switch, the parent id for `ChildDestroyed`.
    pub secondary_id: Option<u64>,
    pub outcome_ok: bool,
    pub termination_cause: Option<TerminationCause>,
}

impl TelemetryEvent {
    pub fn new(timestamp: Instant, kind: EventKind, task_id: TaskId) -> Self {
        Self { timestamp, kind, task_id, secondary_id: None, outcome_ok: true, termination_cause: None }
    }

    pub fn with_secondary(mut self, id: u64) -> Self {
        self.secondary_id = Some(id);
        self
    }

    pub fn with_token(mut self, token_id: TokenId) -> Self {
        self.secondary_id = Some(token_id.0 as u64);
        self
    }

    pub fn with_outcome_ok(mut self, ok: bool) -> Self {
        self.outcome_ok = ok;
        self
    }

    pub fn with_termination(mut self, cause: TerminationCause) -> Self {
        self.termination_cause = Some(cause);
        self
    }
}

/// Receives telemetry events. The exact transport is an embedder choice.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Production sink: forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: TelemetryEvent) {
        tracing::info!(
            kind = %event.kind,
            task_id = event.task_id.0,
            secondary_id = event.secondary_id,
            outcome_ok = event.outcome_ok,
            termination_cause = event.termination_cause.as_ref().map(|c| c.to_string()),
            "governance event"
        );
    }
}

/// Test/embedder sink that collects events in arrival order for assertions.
#[derive(Default)]
pub struct VecSink {
    events: parking_lot::Mutex<Vec<TelemetryEvent>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<TelemetryEvent> {
        std::mem::take(&mut self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl TelemetrySink for VecSink {
    fn record(&self, event: TelemetryEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
