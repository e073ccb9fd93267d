// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn terminated_is_fixed_point() {
    for s in [
        TaskState::New,
        TaskState::Running,
        TaskState::Yielded,
        TaskState::Terminating,
        TaskState::Terminated,
    ] {
        assert!(!TaskState::Terminated.can_transition_to(s));
    }
}

#[test]
fn legal_transitions() {
    assert!(TaskState::New.can_transition_to(TaskState::Running));
    assert!(TaskState::Running.can_transition_to(TaskState::Yielded));
    assert!(TaskState::Yielded.can_transition_to(TaskState::Running));
    assert!(TaskState::Running.can_transition_to(TaskState::Terminating));
    assert!(TaskState::Yielded.can_transition_to(TaskState::Terminating));
    assert!(TaskState::Terminating.can_transition_to(TaskState::Terminated));
}

#[test]
fn illegal_transitions() {
    assert!(!TaskState::New.can_transition_to(TaskState::Terminated));
    assert!(!TaskState::New.can_transition_to(TaskState::Yielded));
    assert!(!TaskState::Running.can_transition_to(TaskState::New));
    assert!(!TaskState::Terminating.can_transition_to(TaskState::Running));
}

#[test]
fn only_terminated_is_terminal() {
    assert!(TaskState::Terminated.is_terminal());
    assert!(!TaskState::New.is_terminal());
    assert!(!TaskState::Running.is_terminal());
    assert!(!TaskState::Yielded.is_terminal());
    assert!(!TaskState::Terminating.is_terminal());
}

#[test]
fn display_impls() {
    assert_eq!(TaskState::New.to_string(), "new");
    assert_eq!(TerminationCause::Natural.to_string(), "natural");
    assert_eq!(TerminationCause::Fault("boom".into()).to_string(), "fault");
}
