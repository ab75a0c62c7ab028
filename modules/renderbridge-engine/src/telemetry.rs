//! TelemetrySink implementations.

use std::sync::{Arc, Mutex, PoisonError};

use renderbridge_common::TelemetryEvent;
use tracing::{error, info, warn};

/// Receives telemetry the bridge emits. Must not block.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

// ---------------------------------------------------------------------------
// TracingSink (production, structured logs)
// ---------------------------------------------------------------------------

/// Writes every event to `tracing` at a level matching its severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: TelemetryEvent) {
        match &event {
            TelemetryEvent::HandlerFailed {
                message_type,
                context,
                error,
            } => {
                error!(
                    message_type = message_type.as_str(),
                    context = context.as_str(),
                    error = error.as_str(),
                    "Renderer message handler failed"
                );
            }
            TelemetryEvent::DeprecatedMessage { message_type } => {
                warn!(message_type = message_type.as_str(), "Deprecated renderer message used");
            }
            TelemetryEvent::UnknownMessage { message_type } => {
                warn!(message_type = message_type.as_str(), "Unknown renderer message");
            }
            TelemetryEvent::ProtocolViolation { call_id, reason } => {
                error!(
                    call_id = call_id.as_str(),
                    reason = reason.as_str(),
                    "Pending call protocol violation"
                );
            }
            TelemetryEvent::Tracked { name, properties } => {
                info!(name = name.as_str(), properties = %properties, "Tracked event");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryTelemetry (tests, no log scraping required)
// ---------------------------------------------------------------------------

/// Records every event in order. Thread-safe.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events (for test assertions).
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events of one type, by `TelemetryEvent::event_type`.
    pub fn of_type(&self, event_type: &str) -> Vec<TelemetryEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl TelemetrySink for MemoryTelemetry {
    fn record(&self, event: TelemetryEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

// ---------------------------------------------------------------------------
// Arc<T> blanket: lets tests share a sink for assertions
// ---------------------------------------------------------------------------

impl<T: TelemetrySink + ?Sized> TelemetrySink for Arc<T> {
    fn record(&self, event: TelemetryEvent) {
        (**self).record(event)
    }
}

// ---------------------------------------------------------------------------
// FanoutSink: one event, several sinks
// ---------------------------------------------------------------------------

/// Forwards every event to each inner sink in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self { sinks }
    }
}

impl TelemetrySink for FanoutSink {
    fn record(&self, event: TelemetryEvent) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.record(event.clone());
            }
            last.record(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanout_reaches_every_sink() {
        let a = Arc::new(MemoryTelemetry::new());
        let b = Arc::new(MemoryTelemetry::new());
        let first: Arc<dyn TelemetrySink> = a.clone();
        let second: Arc<dyn TelemetrySink> = b.clone();
        let fanout = FanoutSink::new(vec![first, second, Arc::new(TracingSink)]);

        fanout.record(TelemetryEvent::UnknownMessage {
            message_type: "X".into(),
        });

        assert_eq!(a.events().len(), 1);
        assert_eq!(b.events(), a.events());
    }
}
