//! Pending call registry.
//!
//! The kernel creates a call, hands its id to the renderer, and awaits the
//! `PendingCall`. A later renderer message carrying the same id settles it.
//! Settled entries are removed immediately; a bounded window of recently
//! settled ids lets a late second settlement be told apart from an id that
//! never existed.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use renderbridge_common::{ProtocolPolicy, TelemetryEvent};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::telemetry::TelemetrySink;

/// How many settled ids are remembered for duplicate detection.
const SETTLED_WINDOW: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallId(String);

impl CallId {
    fn generate() -> Self {
        CallId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CallId {
    fn from(id: String) -> Self {
        CallId(id)
    }
}

impl From<&str> for CallId {
    fn from(id: &str) -> Self {
        CallId(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("rejected by renderer: {0}")]
    Rejected(String),

    #[error("no answer within {0:?}")]
    TimedOut(Duration),

    #[error("registry dropped before the call was settled")]
    Abandoned,
}

/// Result of a `resolve`/`reject` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The awaiter received the value.
    Delivered,
    /// The call was outstanding but its awaiter had already gone away.
    AwaiterGone,
    /// The id was settled earlier. Nothing delivered.
    AlreadySettled,
    /// The id was never created (or fell out of the settled window).
    Unknown,
}

/// Awaiter half of a pending call.
#[derive(Debug)]
pub struct PendingCall {
    id: CallId,
    rx: oneshot::Receiver<Result<Value, CallError>>,
}

impl PendingCall {
    pub fn id(&self) -> &CallId {
        &self.id
    }

    /// Wait for the renderer's answer.
    pub async fn wait(self) -> Result<Value, CallError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(CallError::Abandoned),
        }
    }
}

struct Entry {
    tx: oneshot::Sender<Result<Value, CallError>>,
    created_at: Instant,
}

#[derive(Default)]
struct Inner {
    outstanding: HashMap<CallId, Entry>,
    settled: VecDeque<CallId>,
}

impl Inner {
    fn remember_settled(&mut self, id: CallId) {
        if self.settled.len() == SETTLED_WINDOW {
            self.settled.pop_front();
        }
        self.settled.push_back(id);
    }
}

pub struct PendingCallRegistry {
    inner: Mutex<Inner>,
    timeout: Option<Duration>,
    policy: ProtocolPolicy,
    telemetry: Arc<dyn TelemetrySink>,
}

impl PendingCallRegistry {
    pub fn new(policy: ProtocolPolicy, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            timeout: None,
            policy,
            telemetry,
        }
    }

    /// Reject calls that stay outstanding longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a fresh call. The id is unique among outstanding calls.
    pub fn create(&self) -> (CallId, PendingCall) {
        if self.timeout.is_some() {
            self.evict_expired();
        }

        let (tx, rx) = oneshot::channel();
        let mut inner = self.lock();
        let mut id = CallId::generate();
        while inner.outstanding.contains_key(&id) {
            id = CallId::generate();
        }
        inner.outstanding.insert(
            id.clone(),
            Entry {
                tx,
                created_at: Instant::now(),
            },
        );
        debug!(call_id = %id, outstanding = inner.outstanding.len(), "Pending call created");

        (id.clone(), PendingCall { id, rx })
    }

    pub fn resolve(&self, id: &CallId, value: Value) -> Settlement {
        self.settle(id, Ok(value))
    }

    pub fn reject(&self, id: &CallId, reason: impl Into<String>) -> Settlement {
        self.settle(id, Err(CallError::Rejected(reason.into())))
    }

    fn settle(&self, id: &CallId, result: Result<Value, CallError>) -> Settlement {
        let mut inner = self.lock();
        let Some(entry) = inner.outstanding.remove(id) else {
            let settlement = if inner.settled.contains(id) {
                Settlement::AlreadySettled
            } else {
                Settlement::Unknown
            };
            drop(inner);
            self.report_violation(id, settlement);
            return settlement;
        };
        inner.remember_settled(id.clone());
        drop(inner);

        match entry.tx.send(result) {
            Ok(()) => Settlement::Delivered,
            Err(_) => {
                debug!(call_id = %id, "Pending call settled after its awaiter went away");
                Settlement::AwaiterGone
            }
        }
    }

    fn report_violation(&self, id: &CallId, settlement: Settlement) {
        let reason = match settlement {
            Settlement::AlreadySettled => "settled twice",
            _ => "unknown call id",
        };
        match self.policy {
            ProtocolPolicy::Strict => {
                error!(call_id = %id, reason, "Renderer settled a call it does not own");
                self.telemetry.record(TelemetryEvent::ProtocolViolation {
                    call_id: id.to_string(),
                    reason: reason.to_string(),
                });
            }
            ProtocolPolicy::Lenient => {
                warn!(call_id = %id, reason, "Ignoring settlement of a call that is not outstanding");
            }
        }
    }

    /// Reject every call older than the configured timeout. Returns how many
    /// were evicted.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    /// Same as `evict_expired`, measured against `now`.
    pub fn evict_expired_at(&self, now: Instant) -> usize {
        let Some(timeout) = self.timeout else {
            return 0;
        };

        let mut inner = self.lock();
        let expired: Vec<CallId> = inner
            .outstanding
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.created_at) >= timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(entry) = inner.outstanding.remove(id) {
                let _ = entry.tx.send(Err(CallError::TimedOut(timeout)));
                inner.remember_settled(id.clone());
            }
        }
        drop(inner);

        if !expired.is_empty() {
            warn!(evicted = expired.len(), "Evicted pending calls the renderer never answered");
        }
        expired.len()
    }

    pub fn outstanding(&self) -> usize {
        self.lock().outstanding.len()
    }

    pub fn is_outstanding(&self, id: &CallId) -> bool {
        self.lock().outstanding.contains_key(id)
    }
}
