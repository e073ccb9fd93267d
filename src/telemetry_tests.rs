// SPDX-License-Identifier: MIT

use super::*;
use std::time::Instant;

#[test]
fn vec_sink_collects_in_order() {
    let sink = VecSink::new();
    sink.record(TelemetryEvent::new(Instant::now(), EventKind::TaskRegistered, TaskId(1)));
    sink.record(TelemetryEvent::new(Instant::now(), EventKind::TaskRunning, TaskId(1)));
    assert_eq!(sink.len(), 2);
    let events = sink.drain();
    assert_eq!(events[0].kind, EventKind::TaskRegistered);
    assert_eq!(events[1].kind, EventKind::TaskRunning);
    assert!(sink.is_empty());
}

#[test]
fn event_builders_set_fields() {
    let e = TelemetryEvent::new(Instant::now(), EventKind::TokenAcquired, TaskId(1))
        .with_token(TokenId(3))
        .with_outcome_ok(false);
    assert_eq!(e.secondary_id, Some(3));
    assert!(!e.outcome_ok);
}

#[test]
fn display_impl() {
    assert_eq!(EventKind::ContextSwitchDenied.to_string(), "context_switch:denied");
}

#[test]
fn tracing_sink_forwards_through_a_real_subscriber() {
    let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
    tracing::subscriber::with_default(subscriber, || {
        TracingSink.record(TelemetryEvent::new(Instant::now(), EventKind::TaskRegistered, TaskId(1)));
        TracingSink.record(
            TelemetryEvent::new(Instant::now(), EventKind::TokenAcquired, TaskId(1)).with_token(TokenId(3)),
        );
    });
}
