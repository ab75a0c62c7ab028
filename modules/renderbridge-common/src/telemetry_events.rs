//! Operational telemetry emitted by the bridge.
//!
//! Every variant describes something the bridge observed while routing
//! renderer messages: failures inside handlers, use of deprecated message
//! types, message types nobody routes, and pending-call protocol drift.
//! `Tracked` carries the analytics events some handlers forward verbatim.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    HandlerFailed {
        message_type: String,
        context: String,
        error: String,
    },

    DeprecatedMessage {
        message_type: String,
    },

    UnknownMessage {
        message_type: String,
    },

    ProtocolViolation {
        call_id: String,
        reason: String,
    },

    Tracked {
        name: String,
        properties: serde_json::Value,
    },
}

impl TelemetryEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TelemetryEvent::HandlerFailed { .. } => "handler_failed",
            TelemetryEvent::DeprecatedMessage { .. } => "deprecated_message",
            TelemetryEvent::UnknownMessage { .. } => "unknown_message",
            TelemetryEvent::ProtocolViolation { .. } => "protocol_violation",
            TelemetryEvent::Tracked { .. } => "tracked",
        }
    }

    pub fn handler_failed(
        message_type: impl Into<String>,
        context: impl Into<String>,
        error: &anyhow::Error,
    ) -> Self {
        TelemetryEvent::HandlerFailed {
            message_type: message_type.into(),
            context: context.into(),
            error: format!("{error:#}"),
        }
    }

    pub fn tracked(name: impl Into<String>, properties: serde_json::Value) -> Self {
        TelemetryEvent::Tracked {
            name: name.into(),
            properties,
        }
    }

    pub fn to_payload(&self) -> serde_json::Value {
        // Only string and JSON-value fields; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_tagged_with_snake_case_type() {
        let event = TelemetryEvent::DeprecatedMessage {
            message_type: "Track".into(),
        };
        let payload = event.to_payload();
        assert_eq!(payload["type"], "deprecated_message");
        assert_eq!(payload["message_type"], "Track");
        assert_eq!(event.event_type(), "deprecated_message");
    }

    #[test]
    fn handler_failed_keeps_error_chain() {
        let err = anyhow::anyhow!("socket closed").context("fetching friends");
        let event = TelemetryEvent::handler_failed("GetFriends", "kernel:social", &err);
        match event {
            TelemetryEvent::HandlerFailed { error, .. } => {
                assert_eq!(error, "fetching friends: socket closed");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
