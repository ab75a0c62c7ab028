//! Routing behaviour of MessageRouter against a recording context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use renderbridge_common::{TelemetryEvent, UnknownMessagePolicy};
use renderbridge_engine::{
    DetachedTasks, DispatchTable, FlagGate, MemoryTelemetry, MessageRouter, Outcome, Route,
};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Test context
// ---------------------------------------------------------------------------

struct Recorder {
    calls: Mutex<Vec<(&'static str, Value)>>,
    tasks: DetachedTasks,
}

impl Recorder {
    fn record(&self, name: &'static str, payload: Value) {
        self.calls.lock().unwrap().push((name, payload));
    }

    fn calls(&self) -> Vec<(&'static str, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

struct Harness {
    router: MessageRouter<Recorder>,
    telemetry: Arc<MemoryTelemetry>,
    channels: Arc<AtomicBool>,
}

fn harness(policy: UnknownMessagePolicy) -> Harness {
    let telemetry = Arc::new(MemoryTelemetry::new());
    let channels = Arc::new(AtomicBool::new(false));
    let gate = Arc::new(FlagGate::new("channels", channels.clone()));

    let table = DispatchTable::<Recorder>::builder()
        .route("Alpha", |ctx: &Recorder, p| {
            ctx.record("Alpha", p);
            Ok(())
        })
        .route("Beta", |ctx: &Recorder, p| {
            ctx.record("Beta", p);
            Ok(())
        })
        .add(
            "Legacy",
            Route::new(|ctx: &Recorder, p| {
                ctx.record("Legacy", p);
                Ok(())
            })
            .deprecated(),
        )
        .add(
            "JoinChannel",
            Route::new(|ctx: &Recorder, p| {
                ctx.record("JoinChannel", p);
                Ok(())
            })
            .gated(gate),
        )
        .route("Broken", |_: &Recorder, _| -> Result<()> { bail!("bad payload") })
        .route("Panics", |_: &Recorder, _| -> Result<()> { panic!("handler blew up") })
        .route("SlowFailure", |ctx: &Recorder, _| {
            ctx.tasks.spawn("SlowFailure", "test", async {
                tokio::task::yield_now().await;
                bail!("backend timed out")
            });
            Ok(())
        })
        .build()
        .unwrap();

    let recorder = Recorder {
        calls: Mutex::new(Vec::new()),
        tasks: DetachedTasks::new(telemetry.clone()),
    };

    Harness {
        router: MessageRouter::new(recorder, table, telemetry.clone()).with_unknown_policy(policy),
        telemetry,
        channels,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn registered_type_invokes_exactly_one_handler_once_with_payload_unmodified() {
    let h = harness(UnknownMessagePolicy::Log);
    let payload = json!({"nested": {"list": [1, 2, 3]}, "flag": null});

    assert_eq!(h.router.handle("Alpha", payload.clone()), Outcome::Handled);

    assert_eq!(h.router.context().calls(), vec![("Alpha", payload)]);
}

#[test]
fn unknown_type_invokes_nothing_and_does_not_fail() {
    let h = harness(UnknownMessagePolicy::Log);

    assert_eq!(h.router.handle("FromTheFuture", json!({})), Outcome::Unknown);
    assert_eq!(h.router.handle("Beta", json!(1)), Outcome::Handled);

    assert_eq!(h.router.context().calls(), vec![("Beta", json!(1))]);
    assert!(h.telemetry.events().is_empty());
}

#[test]
fn escalated_unknown_types_are_reported() {
    let h = harness(UnknownMessagePolicy::Escalate);

    assert_eq!(h.router.handle("FromTheFuture", json!({})), Outcome::Unknown);

    assert_eq!(
        h.telemetry.events(),
        vec![TelemetryEvent::UnknownMessage {
            message_type: "FromTheFuture".into()
        }]
    );
}

#[test]
fn gated_handler_is_noop_while_closed_and_normal_when_open() {
    let h = harness(UnknownMessagePolicy::Ignore);

    assert_eq!(
        h.router.handle("JoinChannel", json!({"channelId": "c1"})),
        Outcome::Gated {
            gate: "channels".into()
        }
    );
    assert!(h.router.context().calls().is_empty());

    // Gate is re-read on every call.
    h.channels.store(true, Ordering::Release);
    assert_eq!(
        h.router.handle("JoinChannel", json!({"channelId": "c1"})),
        Outcome::Handled
    );
    assert_eq!(
        h.router.context().calls(),
        vec![("JoinChannel", json!({"channelId": "c1"}))]
    );
}

#[test]
fn deprecated_handler_runs_and_reports_every_use() {
    let h = harness(UnknownMessagePolicy::Ignore);

    h.router.handle("Legacy", json!(1));
    h.router.handle("Legacy", json!(2));

    assert_eq!(h.router.context().calls().len(), 2);
    assert_eq!(h.telemetry.of_type("deprecated_message").len(), 2);
}

#[test]
fn handler_error_is_isolated_and_reported() {
    let h = harness(UnknownMessagePolicy::Ignore);

    assert_eq!(h.router.handle("Broken", json!({})), Outcome::Failed);
    assert_eq!(h.router.handle("Alpha", json!("next")), Outcome::Handled);

    assert_eq!(h.router.context().calls(), vec![("Alpha", json!("next"))]);
    let failures = h.telemetry.of_type("handler_failed");
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        &failures[0],
        TelemetryEvent::HandlerFailed { message_type, error, .. }
            if message_type == "Broken" && error == "bad payload"
    ));
}

#[test]
fn handler_panic_is_isolated_and_reported() {
    let h = harness(UnknownMessagePolicy::Ignore);

    assert_eq!(h.router.handle("Panics", json!({})), Outcome::Failed);
    assert_eq!(h.router.handle("Beta", json!({})), Outcome::Handled);

    let failures = h.telemetry.of_type("handler_failed");
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        &failures[0],
        TelemetryEvent::HandlerFailed { error, .. } if error.contains("handler blew up")
    ));
}

#[tokio::test]
async fn async_failure_does_not_block_later_messages() {
    let h = harness(UnknownMessagePolicy::Ignore);

    assert_eq!(h.router.handle("SlowFailure", json!({})), Outcome::Handled);
    assert_eq!(h.router.handle("Alpha", json!("after")), Outcome::Handled);
    h.router.context().tasks.settle().await;

    assert_eq!(h.router.context().calls(), vec![("Alpha", json!("after"))]);
    assert!(matches!(
        &h.telemetry.of_type("handler_failed")[..],
        [TelemetryEvent::HandlerFailed { message_type, error, .. }]
            if message_type == "SlowFailure" && error == "backend timed out"
    ));
}

#[test]
fn raw_envelopes_are_decoded_or_dropped() {
    let h = harness(UnknownMessagePolicy::Ignore);

    assert_eq!(
        h.router.handle_raw(r#"{"type":"Alpha","payload":{"x":1}}"#),
        Outcome::Handled
    );
    assert_eq!(h.router.handle_raw("not json"), Outcome::Malformed);
    assert_eq!(h.router.handle_raw(r#"{"payload":{}}"#), Outcome::Malformed);

    assert_eq!(h.router.context().calls(), vec![("Alpha", json!({"x": 1}))]);
}
