// SPDX-License-Identifier: MIT

//! Shared test helpers.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::policy::{ConcurrencyMode, DestructionPolicy, TaskPolicy};
use crate::registry::Registry;
use crate::task::TaskRecord;
use crate::token::RESOURCE_NAME_MAX_LEN;
use crate::{id::TaskId, state::TaskState};
use std::time::Instant;

/// Proptest strategies for core data-model types.
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_access_mask() -> impl Strategy<Value = u8> {
        0u8..=3
    }

    pub fn arb_resource_name() -> impl Strategy<Value = String> {
        "[a-z]{1,20}".prop_map(|s| s)
    }

    pub fn arb_concurrency_mode() -> impl Strategy<Value = ConcurrencyMode> {
        prop_oneof![Just(ConcurrencyMode::Simulated), Just(ConcurrencyMode::Parallel)]
    }

    pub fn arb_destruction_policy() -> impl Strategy<Value = DestructionPolicy> {
        prop_oneof![
            Just(DestructionPolicy::Cascade),
            Just(DestructionPolicy::KeepAlive),
            Just(DestructionPolicy::Graceful),
            Just(DestructionPolicy::Immediate),
        ]
    }

    pub fn arb_task_policy() -> impl Strategy<Value = TaskPolicy> {
        (arb_concurrency_mode(), arb_destruction_policy(), any::<bool>()).prop_map(
            |(mode, destroy_policy, keep_alive)| TaskPolicy {
                mode,
                destroy_policy,
                keep_alive,
                ..TaskPolicy::default()
            },
        )
    }
}

/// Register a root-level task with the given policy and return its id.
pub fn register_root_task(registry: &Registry, policy: TaskPolicy) -> TaskId {
    let id = registry.alloc_task_id();
    let record = TaskRecord::new(policy, 0, Instant::now());
    registry.register(id, record).expect("test fixture registration should not exceed registry limits");
    id
}

/// Register a child of `parent` with the given policy and return its id.
pub fn register_child_task(registry: &Registry, parent: TaskId, policy: TaskPolicy) -> TaskId {
    let mut policy = policy;
    policy.parent_id = parent;
    let id = registry.alloc_task_id();
    let depth = registry.generation_depth_for(parent).expect("parent must already be registered");
    let record = TaskRecord::new(policy, depth, Instant::now());
    registry.register(id, record).expect("test fixture registration should not exceed registry limits");
    id
}

/// Force a registered task's state, bypassing the worker loop, for tests
/// that assert on state machine transitions directly.
pub fn force_state(registry: &Registry, task_id: TaskId, state: TaskState) {
    registry.with_mut(task_id, |r| r.state = state).expect("task must be registered");
}

pub fn max_resource_name() -> String {
    "r".repeat(RESOURCE_NAME_MAX_LEN)
}
