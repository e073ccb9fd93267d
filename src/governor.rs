// SPDX-License-Identifier: MIT

//! Context-Switch Governor: validates and executes hand-offs of execution
//! context (and token custody) between related tasks.

use crate::error::GovError;
use crate::id::TaskId;
use crate::registry::Registry;
use crate::scheduler::Cooperative;
use crate::telemetry::{EventKind, TelemetryEvent, TelemetrySink};
use crate::token::TokenPool;
use std::sync::Arc;

/// Validates and executes a context switch between two tasks in the same
/// genealogical hierarchy, transferring eligible token custody.
pub struct ContextSwitchGovernor {
    registry: Arc<Registry>,
    pool: Arc<TokenPool>,
    sink: Arc<dyn TelemetrySink>,
    coop: Arc<Cooperative>,
}

impl ContextSwitchGovernor {
    pub fn new(registry: Arc<Registry>, pool: Arc<TokenPool>, sink: Arc<dyn TelemetrySink>, coop: Arc<Cooperative>) -> Self {
        Self { registry, pool, sink, coop }
    }

    /// Two tasks are in the same hierarchy when:
    /// (a) `from.parent_id == to.id`, or
    /// (b) `to.parent_id == from.id`, or
    /// (c) `from.parent_id == to.parent_id != 0`.
    fn same_hierarchy(&self, from_id: TaskId, to_id: TaskId) -> Option<bool> {
        let from_parent = self.registry.with(from_id, |r| r.policy.parent_id)?;
        let to_parent = self.registry.with(to_id, |r| r.policy.parent_id)?;
        let a = from_parent == to_id;
        let b = to_parent == from_id;
        let c = !from_parent.is_root() && from_parent == to_parent;
        Some(a || b || c)
    }

    /// On success, every transferable token owned by `from_id` moves to
    /// `to_id`, both `context_switches` counters are incremented, and a
    /// cooperative yield nudges `to_id` to the front of the `Simulated`
    /// scheduling queue so it becomes runnable next (a no-op if `to_id` is
    /// `Parallel`-mode or not currently queued). A denied switch has no
    /// side effects and does not increment either counter.
    pub fn context_switch(&self, from_id: TaskId, to_id: TaskId, now: std::time::Instant) -> Result<(), GovError> {
        let from_state = self.registry.with(from_id, |r| r.state).ok_or(GovError::UnknownTask(from_id))?;
        let to_state = self.registry.with(to_id, |r| r.state).ok_or(GovError::UnknownTask(to_id))?;

        let result = if from_state.is_terminal() {
            Err(GovError::TaskTerminated(from_id))
        } else if to_state.is_terminal() {
            Err(GovError::TaskTerminated(to_id))
        } else {
            match self.same_hierarchy(from_id, to_id) {
                Some(true) => Ok(()),
                _ => Err(GovError::NotSameHierarchy),
            }
        };

        if let Err(ref e) = result {
            self.sink.record(
                TelemetryEvent::new(now, EventKind::ContextSwitchDenied, from_id)
                    .with_secondary(to_id.0)
                    .with_outcome_ok(false),
            );
            return Err(e.clone());
        }

        let moved = self.pool.transfer_all_transferable(from_id, to_id);
        self.registry.with_mut(from_id, |r| r.stats.context_switches += 1);
        self.registry.with_mut(to_id, |r| r.stats.context_switches += 1);

        for token_id in &moved {
            self.sink.record(TelemetryEvent::new(now, EventKind::TokenTransferred, to_id).with_token(*token_id));
        }

        self.coop.promote(to_id);

        self.sink.record(
            TelemetryEvent::new(now, EventKind::ContextSwitchOk, from_id).with_secondary(to_id.0),
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "governor_tests.rs"]
mod tests;
