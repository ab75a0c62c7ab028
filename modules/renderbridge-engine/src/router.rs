//! The routing entry point.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use renderbridge_common::{RendererMessage, TelemetryEvent, UnknownMessagePolicy};
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::table::DispatchTable;
use crate::telemetry::TelemetrySink;

/// What happened to one routed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The handler ran and returned normally.
    Handled,
    /// A capability gate was closed; the handler did not run.
    Gated { gate: String },
    /// No route for this message type.
    Unknown,
    /// The handler returned an error or panicked. Already reported.
    Failed,
    /// The raw envelope could not be decoded.
    Malformed,
}

/// Routes renderer messages to handlers.
///
/// Processes one message at a time to completion. Never propagates a
/// handler failure to the caller: errors and panics are turned into
/// `handler_failed` telemetry and routing continues with the next message.
pub struct MessageRouter<C> {
    context: C,
    table: DispatchTable<C>,
    unknown_policy: UnknownMessagePolicy,
    telemetry: Arc<dyn TelemetrySink>,
}

impl<C> MessageRouter<C> {
    pub fn new(context: C, table: DispatchTable<C>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            context,
            table,
            unknown_policy: UnknownMessagePolicy::Log,
            telemetry,
        }
    }

    pub fn with_unknown_policy(mut self, policy: UnknownMessagePolicy) -> Self {
        self.unknown_policy = policy;
        self
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn table(&self) -> &DispatchTable<C> {
        &self.table
    }

    /// Route one message. The payload reaches the handler unmodified.
    pub fn handle(&self, message_type: &str, payload: Value) -> Outcome {
        let Some(route) = self.table.get(message_type) else {
            self.unknown(message_type, &payload);
            return Outcome::Unknown;
        };

        if let Some(gate) = route.gate.as_deref() {
            if !gate.enabled() {
                debug!(message_type, gate = gate.name(), "Capability disabled, skipping");
                return Outcome::Gated {
                    gate: gate.name().to_string(),
                };
            }
        }

        if route.deprecated {
            self.telemetry.record(TelemetryEvent::DeprecatedMessage {
                message_type: message_type.to_string(),
            });
        }

        trace!(message_type, "Routing renderer message");
        let result = catch_unwind(AssertUnwindSafe(|| {
            (route.handler)(&self.context, payload)
        }));

        match result {
            Ok(Ok(())) => Outcome::Handled,
            Ok(Err(err)) => {
                self.telemetry.record(TelemetryEvent::handler_failed(
                    message_type,
                    "renderer-message",
                    &err,
                ));
                Outcome::Failed
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                self.telemetry.record(TelemetryEvent::HandlerFailed {
                    message_type: message_type.to_string(),
                    context: "renderer-message".to_string(),
                    error: format!("handler panicked: {reason}"),
                });
                Outcome::Failed
            }
        }
    }

    /// Decode a `{"type": ..., "payload": ...}` envelope and route it.
    pub fn handle_raw(&self, raw: &str) -> Outcome {
        match serde_json::from_str::<RendererMessage>(raw) {
            Ok(message) => self.handle(&message.message_type, message.payload),
            Err(err) => {
                warn!(error = %err, "Dropping malformed renderer envelope");
                Outcome::Malformed
            }
        }
    }

    fn unknown(&self, message_type: &str, payload: &Value) {
        match self.unknown_policy {
            UnknownMessagePolicy::Ignore => {
                trace!(message_type, "Unknown renderer message ignored");
            }
            UnknownMessagePolicy::Log => {
                info!(
                    message_type,
                    payload = %payload,
                    "Unknown renderer message (no route registered)"
                );
            }
            UnknownMessagePolicy::Escalate => {
                warn!(message_type, "Unknown renderer message (no route registered)");
                self.telemetry.record(TelemetryEvent::UnknownMessage {
                    message_type: message_type.to_string(),
                });
            }
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
