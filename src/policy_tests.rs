// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn default_policy_is_simulated_cascade_root() {
    let p = TaskPolicy::default();
    assert_eq!(p.mode, ConcurrencyMode::Simulated);
    assert_eq!(p.destroy_policy, DestructionPolicy::Cascade);
    assert!(p.parent_id.is_root());
    assert!(!p.daemon_mode);
}

#[test]
fn builder_overrides_fields() {
    let p = TaskPolicy::builder()
        .mode(ConcurrencyMode::Parallel)
        .destroy_policy(DestructionPolicy::Graceful)
        .max_trace_depth(4)
        .trace_capped(true)
        .build();
    assert_eq!(p.mode, ConcurrencyMode::Parallel);
    assert_eq!(p.destroy_policy, DestructionPolicy::Graceful);
    assert!(p.trace_capped);
    assert_eq!(p.max_trace_depth, 4);
}

#[test]
fn display_impls() {
    assert_eq!(ConcurrencyMode::Simulated.to_string(), "simulated");
    assert_eq!(ConcurrencyMode::Parallel.to_string(), "parallel");
    assert_eq!(DestructionPolicy::Cascade.to_string(), "cascade");
    assert_eq!(DestructionPolicy::KeepAlive.to_string(), "keep_alive");
    assert_eq!(DestructionPolicy::Graceful.to_string(), "graceful");
    assert_eq!(DestructionPolicy::Immediate.to_string(), "immediate");
}
