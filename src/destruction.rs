// SPDX-License-Identifier: MIT

//! Destruction Policy Engine: applies a child's declared destruction
//! policy when its parent terminates.

use crate::id::TaskId;
use crate::lifecycle::{request_graceful, request_immediate};
use crate::policy::DestructionPolicy;
use crate::registry::Registry;
use crate::state::TaskState;
use crate::telemetry::{EventKind, TelemetryEvent, TelemetrySink};
use std::sync::Arc;

/// Walks a destroyed parent's children and applies each child's declared
/// [`DestructionPolicy`].
pub struct DestructionPolicyEngine {
    registry: Arc<Registry>,
    sink: Arc<dyn TelemetrySink>,
}

impl DestructionPolicyEngine {
    pub fn new(registry: Arc<Registry>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self { registry, sink }
    }

    /// Invoked after `parent_id` has reached `Terminated`; children are visited in
    /// ascending task-id order (deterministic telemetry/log ordering), and
    /// a child already `Terminating`/`Terminated` is skipped.
    pub fn on_parent_destroyed(&self, parent_id: TaskId, now: std::time::Instant) -> usize {
        let mut affected = 0;
        for child_id in self.registry.children_of(parent_id) {
            let Some(state) = self.registry.with(child_id, |r| r.state) else {
                continue;
            };
            if state.is_terminal() || state == TaskState::Terminating {
                continue;
            }

            let policy = match self.registry.with(child_id, |r| r.policy.destroy_policy) {
                Some(p) => p,
                None => continue,
            };

            match policy {
                DestructionPolicy::Cascade => {
                    let _ = request_immediate(&self.registry, child_id);
                }
                DestructionPolicy::KeepAlive => {
                    let keep_alive = self.registry.with(child_id, |r| r.policy.keep_alive).unwrap_or(false);
                    if keep_alive {
                        self.registry.with_mut(child_id, |r| {
                            r.policy.parent_id = TaskId::ROOT;
                            r.policy.daemon_mode = true;
                        });
                    } else {
                        let _ = request_immediate(&self.registry, child_id);
                    }
                }
                DestructionPolicy::Graceful => {
                    let _ = request_graceful(&self.registry, child_id);
                }
                DestructionPolicy::Immediate => {
                    let _ = request_immediate(&self.registry, child_id);
                }
            }

            self.sink.record(
                TelemetryEvent::new(now, EventKind::ChildDestroyed, child_id).with_secondary(parent_id.0),
            );
            affected += 1;
        }
        affected
    }
}

#[cfg(test)]
#[path = "destruction_tests.rs"]
mod tests;
