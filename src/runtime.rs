// SPDX-License-Identifier: MIT

//! Top-level façade wiring the Registry, Token Pool, Lifecycle Engine,
//! Destruction Policy Engine, and Context-Switch Governor behind a single
//! external interface.

use crate::clock::Clock;
use crate::destruction::DestructionPolicyEngine;
use crate::error::GovError;
use crate::governor::ContextSwitchGovernor;
use crate::id::{TaskId, TokenId};
use crate::lifecycle::LifecycleEngine;
use crate::policy::TaskPolicy;
use crate::registry::Registry;
use crate::state::TerminationCause;
use crate::telemetry::{EventKind, TelemetryEvent, TelemetrySink};
use crate::token::TokenPool;
use crate::work::Work;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Top-level governance runtime. Constructed with an injected [`Clock`] and
/// [`TelemetrySink`] rather than touching process globals — this crate has
/// no process singleton to initialize twice.
pub struct Runtime {
    registry: Arc<Registry>,
    pool: Arc<TokenPool>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn TelemetrySink>,
    lifecycle: LifecycleEngine,
    destruction: DestructionPolicyEngine,
    governor: ContextSwitchGovernor,
    running: AtomicBool,
}

impl Runtime {
    /// Construct a stopped runtime. Call [`Self::start`] before use.
    ///
    /// `auto_cascade`, when set, wires `on_parent_destroyed` to fire
    /// automatically the moment a task's worker wrapper observes
    /// `Terminated`. Additive; defaults to `false` when unset.
    pub fn new(clock: Arc<dyn Clock>, sink: Arc<dyn TelemetrySink>, auto_cascade: bool) -> Self {
        let registry = Arc::new(Registry::new());
        let pool = Arc::new(TokenPool::new());

        let mut lifecycle = LifecycleEngine::new(registry.clone(), pool.clone(), clock.clone(), sink.clone());
        if auto_cascade {
            let hook_registry = registry.clone();
            let hook_sink = sink.clone();
            let hook_clock = clock.clone();
            lifecycle = lifecycle.with_on_terminate(Arc::new(move |task_id| {
                let engine = DestructionPolicyEngine::new(hook_registry.clone(), hook_sink.clone());
                engine.on_parent_destroyed(task_id, hook_clock.now());
            }));
        }

        let destruction = DestructionPolicyEngine::new(registry.clone(), sink.clone());
        let governor =
            ContextSwitchGovernor::new(registry.clone(), pool.clone(), sink.clone(), lifecycle.cooperative());

        Self { registry, pool, clock, sink, lifecycle, destruction, governor, running: AtomicBool::new(false) }
    }

    pub fn start(&self) -> Result<(), GovError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(GovError::AlreadyInitialized);
        }
        Ok(())
    }

    fn require_running(&self) -> Result<(), GovError> {
        if self.running.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GovError::NotInitialized)
        }
    }

    /// `work_fn`/`arg` are one generic `work: W` — see [`crate::work`].
    pub fn spawn<W: Work>(&self, policy: TaskPolicy, work: W) -> Result<TaskId, GovError> {
        self.require_running()?;
        self.lifecycle.spawn(policy, work)
    }

    pub fn join(&self, task_id: TaskId) -> Result<TerminationCause, GovError> {
        self.require_running()?;
        self.lifecycle.join(task_id)
    }

    pub fn request_graceful(&self, task_id: TaskId) -> Result<(), GovError> {
        self.require_running()?;
        self.lifecycle.request_graceful(task_id)
    }

    pub fn request_immediate(&self, task_id: TaskId) -> Result<(), GovError> {
        self.require_running()?;
        self.lifecycle.request_immediate(task_id)
    }

    pub fn on_parent_destroyed(&self, parent_id: TaskId) -> Result<usize, GovError> {
        self.require_running()?;
        Ok(self.destruction.on_parent_destroyed(parent_id, self.clock.now()))
    }

    /// Returns a `Result` rather than a "0 on failure" sentinel — idiomatic
    /// Rust has no reserved invalid-id value to overload.
    pub fn acquire_token(&self, task_id: TaskId, resource_name: &str, access_mask: u8) -> Result<TokenId, GovError> {
        self.require_running()?;
        match self.registry.with(task_id, |r| r.is_runnable_for_token_ops()) {
            Some(true) => {
                let token_id = self.pool.acquire(task_id, resource_name, access_mask, self.clock.now())?;
                self.sink.record(
                    TelemetryEvent::new(self.clock.now(), EventKind::TokenAcquired, task_id).with_token(token_id),
                );
                Ok(token_id)
            }
            _ => Err(GovError::UnknownRequester(task_id)),
        }
    }

    pub fn release_token(&self, token_id: TokenId) -> Result<(), GovError> {
        self.require_running()?;
        let owner = self.pool.snapshot(token_id)?.owner_thread_id;
        self.pool.release(token_id)?;
        self.sink.record(
            TelemetryEvent::new(self.clock.now(), EventKind::TokenReleased, owner).with_token(token_id),
        );
        Ok(())
    }

    pub fn context_switch(&self, from_id: TaskId, to_id: TaskId) -> Result<(), GovError> {
        self.require_running()?;
        self.governor.context_switch(from_id, to_id, self.clock.now())
    }

    /// Forces every still-live task to terminate immediately, joins and
    /// reaps each, then marks the runtime stopped. Returns the count of
    /// tasks drained.
    pub fn shutdown(&self) -> Result<usize, GovError> {
        self.require_running()?;
        let live = self.registry.all_ids();
        for &id in &live {
            let _ = self.lifecycle.request_immediate(id);
        }
        let mut drained = 0;
        for id in live {
            if self.lifecycle.join(id).is_ok() {
                let _ = self.lifecycle.reap(id);
                drained += 1;
            }
        }
        self.running.store(false, Ordering::SeqCst);
        Ok(drained)
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
