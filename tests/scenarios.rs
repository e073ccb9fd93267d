// SPDX-License-Identifier: MIT

//! End-to-end governance scenarios, driven entirely through the public
//! `Runtime` façade.

use std::sync::Arc;
use std::time::Duration;
use taskgov::clock::FakeClock;
use taskgov::telemetry::VecSink;
use taskgov::token::access;
use taskgov::{ConcurrencyMode, DestructionPolicy, Runtime, TaskPolicy, TerminationCause, WorkCycleOutcome};

fn runtime() -> Runtime {
    let clock = Arc::new(FakeClock::new());
    let sink = Arc::new(VecSink::new());
    let rt = Runtime::new(clock, sink, false);
    rt.start().unwrap();
    rt
}

fn long_running() -> impl FnMut() -> WorkCycleOutcome {
    move || {
        std::thread::sleep(Duration::from_millis(100));
        WorkCycleOutcome::Continue
    }
}

#[test]
fn cascade_scenario_terminates_child_and_empties_children_of() {
    let rt = runtime();
    let parent_policy = TaskPolicy { mode: ConcurrencyMode::Parallel, ..TaskPolicy::default() };
    let parent = rt.spawn(parent_policy, || WorkCycleOutcome::Done).unwrap();
    rt.join(parent).unwrap();

    let child_policy = TaskPolicy {
        parent_id: parent,
        mode: ConcurrencyMode::Parallel,
        destroy_policy: DestructionPolicy::Cascade,
        ..TaskPolicy::default()
    };
    let child = rt.spawn(child_policy, long_running()).unwrap();

    let affected = rt.on_parent_destroyed(parent).unwrap();
    assert_eq!(affected, 1);
    assert_eq!(rt.join(child).unwrap(), TerminationCause::Immediate);
}

#[test]
fn keep_alive_scenario_orphans_child_as_daemon() {
    let rt = runtime();
    let parent_policy = TaskPolicy { mode: ConcurrencyMode::Parallel, ..TaskPolicy::default() };
    let parent = rt.spawn(parent_policy, || WorkCycleOutcome::Done).unwrap();
    rt.join(parent).unwrap();

    let child_policy = TaskPolicy {
        parent_id: parent,
        mode: ConcurrencyMode::Parallel,
        destroy_policy: DestructionPolicy::KeepAlive,
        keep_alive: true,
        ..TaskPolicy::default()
    };
    let child = rt.spawn(child_policy, long_running()).unwrap();

    rt.on_parent_destroyed(parent).unwrap();
    std::thread::sleep(Duration::from_millis(10));

    rt.request_immediate(child).unwrap();
    assert_eq!(rt.join(child).unwrap(), TerminationCause::Immediate);
}

#[test]
fn graceful_scenario_observes_cancel_at_checkpoint() {
    let rt = runtime();
    let parent_policy = TaskPolicy { mode: ConcurrencyMode::Parallel, ..TaskPolicy::default() };
    let parent = rt.spawn(parent_policy, || WorkCycleOutcome::Done).unwrap();
    rt.join(parent).unwrap();

    let child_policy = TaskPolicy {
        parent_id: parent,
        mode: ConcurrencyMode::Parallel,
        destroy_policy: DestructionPolicy::Graceful,
        ..TaskPolicy::default()
    };
    let child = rt.spawn(child_policy, long_running()).unwrap();

    let affected = rt.on_parent_destroyed(parent).unwrap();
    assert_eq!(affected, 1);
    assert_eq!(rt.join(child).unwrap(), TerminationCause::Graceful);
}

#[test]
fn token_transfer_on_switch_moves_owner_and_counts_both_sides() {
    let rt = runtime();
    let parent_policy = TaskPolicy { mode: ConcurrencyMode::Parallel, ..TaskPolicy::default() };
    let parent = rt.spawn(parent_policy, long_running()).unwrap();

    let sibling_policy = TaskPolicy { parent_id: parent, mode: ConcurrencyMode::Parallel, ..TaskPolicy::default() };
    let c1 = rt.spawn(sibling_policy, long_running()).unwrap();
    let c2 = rt.spawn(sibling_policy, long_running()).unwrap();

    let token = rt.acquire_token(c1, "shared-resource", access::READ | access::WRITE).unwrap();
    rt.context_switch(c1, c2).unwrap();

    rt.request_immediate(parent).unwrap();
    rt.request_immediate(c1).unwrap();
    rt.request_immediate(c2).unwrap();
    rt.join(parent).unwrap();
    rt.join(c1).unwrap();
    rt.join(c2).unwrap();

    // Token custody moved to c2 before c2's worker reclaimed it on exit —
    // verified indirectly: release on the original owner now fails because
    // c2 (not c1) holds it, and c2's termination already reclaimed it.
    assert!(rt.release_token(token).is_err());
}

#[test]
fn switch_denied_across_unrelated_hierarchies() {
    let rt = runtime();
    let p1_policy = TaskPolicy { mode: ConcurrencyMode::Parallel, ..TaskPolicy::default() };
    let p1 = rt.spawn(p1_policy, long_running()).unwrap();
    let p2 = rt.spawn(p1_policy, long_running()).unwrap();

    let c1 = rt.spawn(
        TaskPolicy { parent_id: p1, mode: ConcurrencyMode::Parallel, ..TaskPolicy::default() },
        long_running(),
    ).unwrap();
    let c4 = rt.spawn(
        TaskPolicy { parent_id: p2, mode: ConcurrencyMode::Parallel, ..TaskPolicy::default() },
        long_running(),
    ).unwrap();

    assert!(rt.context_switch(c1, c4).is_err());

    for id in [p1, p2, c1, c4] {
        rt.request_immediate(id).unwrap();
        rt.join(id).unwrap();
    }
}

#[test]
fn pool_exhaustion_then_release_reuses_slot() {
    let rt = runtime();
    let policy = TaskPolicy { mode: ConcurrencyMode::Parallel, ..TaskPolicy::default() };
    let holder = rt.spawn(policy, long_running()).unwrap();

    let mut tokens = Vec::new();
    for i in 0..64 {
        tokens.push(rt.acquire_token(holder, &format!("res-{i}"), access::READ).unwrap());
    }
    assert!(rt.acquire_token(holder, "overflow", access::READ).is_err());

    rt.release_token(tokens[0]).unwrap();
    let reused = rt.acquire_token(holder, "reused", access::READ).unwrap();
    assert_eq!(reused, tokens[0]);

    rt.request_immediate(holder).unwrap();
    rt.join(holder).unwrap();
}
