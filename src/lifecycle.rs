// SPDX-License-Identifier: MIT

//! Task Lifecycle Engine: spawns worker tasks, runs their work loop, and
//! enforces cancellation, deadlines, and trace-depth caps.

use crate::clock::Clock;
use crate::error::GovError;
use crate::id::TaskId;
use crate::policy::{ConcurrencyMode, TaskPolicy};
use crate::registry::Registry;
use crate::scheduler::Cooperative;
use crate::state::{TaskState, TerminationCause};
use crate::task::TaskRecord;
use crate::telemetry::{EventKind, TelemetryEvent, TelemetrySink};
use crate::token::TokenPool;
use crate::work::{Work, WorkCycleOutcome};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Work-cycle quantum for yield and deadline checks.
pub const YIELD_PERIOD: u64 = 10;

/// Set a task's cancel flag, requesting cooperative cancellation.
///
/// Free function (rather than a method requiring the whole engine) because
/// cancellation is purely a registry mutation: the worker loop itself polls
/// `cancel_flag`/`force_cancel` every cycle, so this has no other side
/// effect to perform. Shared by [`LifecycleEngine::request_graceful`] and
/// [`crate::destruction::DestructionPolicyEngine`].
pub fn request_graceful(registry: &Registry, task_id: TaskId) -> Result<(), GovError> {
    registry.with_mut(task_id, |r| r.cancel_flag = true).ok_or(GovError::UnknownTask(task_id))
}

/// Set a task's cancel and force-cancel flags, requesting immediate cancellation.
pub fn request_immediate(registry: &Registry, task_id: TaskId) -> Result<(), GovError> {
    registry
        .with_mut(task_id, |r| {
            r.cancel_flag = true;
            r.force_cancel = true;
        })
        .ok_or(GovError::UnknownTask(task_id))
}

/// Holds every queued `Simulated`-mode task's boxed work closure, keyed by
/// id, for the single driver thread to pull from as it dequeues turns off
/// [`Cooperative`].
struct SimulatedDriver {
    works: parking_lot::Mutex<HashMap<TaskId, Box<dyn Work>>>,
}

impl SimulatedDriver {
    fn new() -> Self {
        Self { works: parking_lot::Mutex::new(HashMap::new()) }
    }

    fn stash(&self, task_id: TaskId, work: Box<dyn Work>) {
        self.works.lock().insert(task_id, work);
    }

    fn take(&self, task_id: TaskId) -> Option<Box<dyn Work>> {
        self.works.lock().remove(&task_id)
    }
}

/// Runs worker tasks and enforces their lifecycle.
///
/// `Parallel`-mode tasks each get their own OS thread. `Simulated`-mode
/// tasks are handed to one lazily-started dedicated driver thread, which
/// round-robins them off [`Cooperative`]'s FIFO queue so that no two
/// `Simulated` work closures are ever running at the same instant.
pub struct LifecycleEngine {
    registry: Arc<Registry>,
    pool: Arc<TokenPool>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn TelemetrySink>,
    coop: Arc<Cooperative>,
    simulated: Arc<SimulatedDriver>,
    driver_started: Arc<AtomicBool>,
    /// Optional hook run after a task reaches `Terminated`, receiving its id.
    /// Used by [`crate::runtime::Runtime`]'s opt-in `auto_cascade`.
    on_terminate: Option<Arc<dyn Fn(TaskId) + Send + Sync>>,
}

impl LifecycleEngine {
    pub fn new(registry: Arc<Registry>, pool: Arc<TokenPool>, clock: Arc<dyn Clock>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            registry,
            pool,
            clock,
            sink,
            coop: Arc::new(Cooperative::new()),
            simulated: Arc::new(SimulatedDriver::new()),
            driver_started: Arc::new(AtomicBool::new(false)),
            on_terminate: None,
        }
    }

    pub fn with_on_terminate(mut self, hook: Arc<dyn Fn(TaskId) + Send + Sync>) -> Self {
        self.on_terminate = Some(hook);
        self
    }

    /// The `Simulated`-mode scheduling queue, shared with
    /// [`crate::governor::ContextSwitchGovernor`] so a successful switch can
    /// promote its target to the front of the turn order.
    pub fn cooperative(&self) -> Arc<Cooperative> {
        self.coop.clone()
    }

    /// Registers `policy`/`work` and either starts a dedicated worker
    /// thread (`Parallel`) or hands the work to the shared `Simulated`
    /// driver thread, starting it on first use.
    ///
    /// `work_fn`/`work_arg` are one generic `work: W` parameter — see
    /// [`crate::work`] for why.
    pub fn spawn<W: Work>(&self, policy: TaskPolicy, work: W) -> Result<TaskId, GovError> {
        let depth = self.registry.generation_depth_for(policy.parent_id)?;
        let task_id = self.registry.alloc_task_id();
        let now = self.clock.now();
        let record = TaskRecord::new(policy, depth, now);
        self.registry.register(task_id, record)?;
        self.sink.record(TelemetryEvent::new(now, EventKind::TaskRegistered, task_id));

        match policy.mode {
            ConcurrencyMode::Simulated => {
                self.simulated.stash(task_id, Box::new(work));
                self.coop.enqueue(task_id);
                self.ensure_driver_started();
            }
            ConcurrencyMode::Parallel => self.spawn_worker_thread(task_id, work),
        }
        Ok(task_id)
    }

    fn spawn_worker_thread<W: Work>(&self, task_id: TaskId, work: W) {
        let registry = self.registry.clone();
        let pool = self.pool.clone();
        let clock = self.clock.clone();
        let sink = self.sink.clone();
        let on_terminate = self.on_terminate.clone();

        let builder = std::thread::Builder::new().name(format!("taskgov-worker-{}", task_id.0));
        let spawned = builder.spawn(move || {
            let mut work = work;
            registry.transition_state(task_id, TaskState::Running);
            sink.record(TelemetryEvent::new(clock.now(), EventKind::TaskRunning, task_id));

            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                run_slice(&registry, clock.as_ref(), task_id, u64::MAX, &mut work)
            }));
            let termination = match outcome {
                Ok(SliceOutcome::Terminated(cause)) => cause,
                // slice_cycles == u64::MAX never hits its bound.
                Ok(SliceOutcome::Pending) => unreachable!("an unbounded slice cannot yield early"),
                Err(payload) => TerminationCause::Fault(panic_message(&payload)),
            };

            finalize_worker(&registry, &pool, clock.as_ref(), sink.as_ref(), task_id, termination);
            if let Some(hook) = on_terminate {
                hook(task_id);
            }
        });
        // A thread-spawn failure here is a runtime bug (resource exhaustion at
        // the OS level), not a recoverable governance error; the task stays
        // `New` forever, which is observable via `join` never returning.
        if let Err(e) = spawned {
            tracing::error!(task_id = task_id.0, error = %e, "failed to spawn worker thread");
        }
    }

    /// Lazily starts the single dedicated driver thread that runs every
    /// `Simulated`-mode task. A no-op after the first call.
    fn ensure_driver_started(&self) {
        if self.driver_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let registry = self.registry.clone();
        let pool = self.pool.clone();
        let clock = self.clock.clone();
        let sink = self.sink.clone();
        let coop = self.coop.clone();
        let simulated = self.simulated.clone();
        let on_terminate = self.on_terminate.clone();

        let builder = std::thread::Builder::new().name("taskgov-simulated-driver".to_string());
        let spawned = builder.spawn(move || loop {
            let task_id = coop.next();
            let Some(mut work) = simulated.take(task_id) else {
                // Enqueued but no stashed work: the task was already reaped
                // out from under us (unregistered between enqueue and pop).
                continue;
            };

            registry.transition_state(task_id, TaskState::Running);
            sink.record(TelemetryEvent::new(clock.now(), EventKind::TaskRunning, task_id));

            let yields = registry.with(task_id, |r| r.policy.return_to_main_required).unwrap_or(false);
            let slice_cycles = if yields { YIELD_PERIOD } else { u64::MAX };

            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                run_slice(&registry, clock.as_ref(), task_id, slice_cycles, work.as_mut())
            }));

            match outcome {
                Ok(SliceOutcome::Pending) => {
                    registry.transition_state(task_id, TaskState::Yielded);
                    sink.record(TelemetryEvent::new(clock.now(), EventKind::TaskYielded, task_id));
                    simulated.stash(task_id, work);
                    coop.enqueue(task_id);
                }
                Ok(SliceOutcome::Terminated(cause)) => {
                    finalize_worker(&registry, &pool, clock.as_ref(), sink.as_ref(), task_id, cause);
                    if let Some(hook) = &on_terminate {
                        hook(task_id);
                    }
                }
                Err(payload) => {
                    let cause = TerminationCause::Fault(panic_message(&payload));
                    finalize_worker(&registry, &pool, clock.as_ref(), sink.as_ref(), task_id, cause);
                    if let Some(hook) = &on_terminate {
                        hook(task_id);
                    }
                }
            }
        });
        if let Err(e) = spawned {
            tracing::error!(error = %e, "failed to spawn simulated-mode driver thread");
        }
    }

    pub fn request_graceful(&self, task_id: TaskId) -> Result<(), GovError> {
        request_graceful(&self.registry, task_id)
    }

    pub fn request_immediate(&self, task_id: TaskId) -> Result<(), GovError> {
        request_immediate(&self.registry, task_id)
    }

    /// Blocks until `task_id` reaches `Terminated`, then returns the cause.
    pub fn join(&self, task_id: TaskId) -> Result<TerminationCause, GovError> {
        let signal = self.registry.with(task_id, |r| r.join_signal.clone()).ok_or(GovError::UnknownTask(task_id))?;
        signal.wait();
        self.registry
            .with(task_id, |r| r.termination.clone())
            .flatten()
            .ok_or(GovError::UnknownTask(task_id))
    }

    /// Remove a `Terminated` task's record from the registry. Tasks are
    /// retained for inspection until reaped, not removed on termination.
    pub fn reap(&self, task_id: TaskId) -> Result<(), GovError> {
        let state = self.registry.with(task_id, |r| r.state).ok_or(GovError::UnknownTask(task_id))?;
        if state != TaskState::Terminated {
            return Err(GovError::UnknownTask(task_id));
        }
        self.registry.unregister(task_id);
        Ok(())
    }
}

#[derive(Clone, Copy)]
struct LoopFields {
    cancel: bool,
    force_cancel: bool,
    trace_capped: bool,
    max_trace_depth: u8,
    depth: u8,
    max_execution_time_ms: u64,
    creation_time: std::time::Instant,
}

fn read_loop_fields(registry: &Registry, task_id: TaskId) -> Option<LoopFields> {
    registry.with(task_id, |r| LoopFields {
        cancel: r.cancel_flag,
        force_cancel: r.force_cancel,
        trace_capped: r.policy.trace_capped,
        max_trace_depth: r.policy.max_trace_depth,
        depth: r.generation_depth,
        max_execution_time_ms: r.policy.max_execution_time_ms,
        creation_time: r.creation_time,
    })
}

fn cancel_cause(force: bool) -> TerminationCause {
    if force {
        TerminationCause::Immediate
    } else {
        TerminationCause::Graceful
    }
}

/// Result of driving a task through one scheduling slice.
enum SliceOutcome {
    /// The task has more work to do; it should be re-enqueued.
    Pending,
    /// The task reached a terminal outcome.
    Terminated(TerminationCause),
}

/// Runs `work` for up to `slice_cycles` cycles (or until it reaches a
/// terminal condition, whichever comes first), checking cancellation, the
/// trace-depth cap, and the deadline after every cycle. `u64::MAX` means
/// "run to completion" — the `Parallel`-mode case, which never yields
/// early; a finite value bounds a single `Simulated`-mode turn.
fn run_slice(
    registry: &Registry,
    clock: &dyn Clock,
    task_id: TaskId,
    slice_cycles: u64,
    work: &mut dyn Work,
) -> SliceOutcome {
    let mut cycles_this_slice = 0u64;
    loop {
        let Some(fields) = read_loop_fields(registry, task_id) else {
            return SliceOutcome::Terminated(TerminationCause::Natural);
        };
        if fields.cancel {
            return SliceOutcome::Terminated(cancel_cause(fields.force_cancel));
        }

        match work.step() {
            WorkCycleOutcome::Done => return SliceOutcome::Terminated(TerminationCause::Natural),
            WorkCycleOutcome::Continue => {}
        }

        registry.with_mut(task_id, |r| r.stats.work_cycles += 1);
        cycles_this_slice += 1;

        let now = clock.now();
        if fields.trace_capped && fields.depth > fields.max_trace_depth {
            return SliceOutcome::Terminated(TerminationCause::TraceCap);
        }
        if fields.max_execution_time_ms > 0 {
            let elapsed_ms = now.saturating_duration_since(fields.creation_time).as_millis() as u64;
            if elapsed_ms > fields.max_execution_time_ms {
                return SliceOutcome::Terminated(TerminationCause::Deadline);
            }
        }
        registry.with_mut(task_id, |r| r.last_heartbeat = now);

        let Some(fields) = read_loop_fields(registry, task_id) else {
            return SliceOutcome::Terminated(TerminationCause::Natural);
        };
        if fields.cancel {
            return SliceOutcome::Terminated(cancel_cause(fields.force_cancel));
        }

        if cycles_this_slice >= slice_cycles {
            return SliceOutcome::Pending;
        }
    }
}

/// Drives a task through `Terminating` -> `Terminated`: reclaims its
/// tokens, records the termination, and wakes any `join` waiters.
fn finalize_worker(
    registry: &Registry,
    pool: &TokenPool,
    clock: &dyn Clock,
    sink: &dyn TelemetrySink,
    task_id: TaskId,
    termination: TerminationCause,
) {
    let terminating_at = clock.now();
    registry.transition_state(task_id, TaskState::Terminating);
    sink.record(TelemetryEvent::new(terminating_at, EventKind::TaskTerminating, task_id));

    pool.reclaim_owned_by(task_id);

    let terminated_at = clock.now();
    registry.transition_state(task_id, TaskState::Terminated);
    registry.with_mut(task_id, |r| r.termination = Some(termination.clone()));
    sink.record(
        TelemetryEvent::new(terminated_at, EventKind::TaskTerminated, task_id).with_termination(termination),
    );

    if let Some(signal) = registry.with(task_id, |r| r.join_signal.clone()) {
        signal.signal();
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked with non-string payload".to_string()
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
