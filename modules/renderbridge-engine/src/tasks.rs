//! Detached handler work.
//!
//! Handlers return before their asynchronous work finishes. Each piece of
//! that work is spawned here so its failure lands in telemetry with the
//! originating message type attached, whether it returned an error or
//! panicked.

use std::collections::BTreeMap;
use std::future::Future;
use std::mem;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use futures::FutureExt;
use renderbridge_common::TelemetryEvent;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::router::panic_message;
use crate::telemetry::TelemetrySink;

type Running = Arc<Mutex<BTreeMap<u64, String>>>;

#[derive(Clone)]
pub struct DetachedTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    running: Running,
    next_id: Arc<AtomicU64>,
    telemetry: Arc<dyn TelemetrySink>,
}

/// Removes one entry from the running set when the work is dropped,
/// finished or not.
struct RunningGuard {
    running: Running,
    id: u64,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl DetachedTasks {
    pub fn new(telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            telemetry,
        }
    }

    /// Run `work` in the background. An `Err` or a panic is recorded as
    /// `handler_failed` for `message_type` under `context`.
    pub fn spawn<F>(&self, message_type: &'static str, context: impl Into<String>, work: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let context = context.into();
        let telemetry = self.telemetry.clone();

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                telemetry.record(TelemetryEvent::HandlerFailed {
                    message_type: message_type.to_string(),
                    context,
                    error: format!("no async runtime: {err}"),
                });
                return;
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, format!("{message_type} ({context})"));
        let guard = RunningGuard {
            running: self.running.clone(),
            id,
        };

        let handle = runtime.spawn(async move {
            let _guard = guard;
            let error = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(Ok(())) => return,
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => format!("handler panicked: {}", panic_message(panic.as_ref())),
            };
            telemetry.record(TelemetryEvent::HandlerFailed {
                message_type: message_type.to_string(),
                context,
                error,
            });
        });

        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of spawned tasks not yet finished.
    pub fn in_flight(&self) -> usize {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `"<message type> (<context>)"` for every task still running, oldest
    /// first.
    pub fn pending(&self) -> Vec<String> {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Wait until every detached task, including ones spawned while
    /// waiting, has finished.
    pub async fn settle(&self) {
        loop {
            let batch = {
                let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
                mem::take(&mut *handles)
            };
            if batch.is_empty() {
                return;
            }
            // Failures were already recorded inside each task.
            futures::future::join_all(batch).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemoryTelemetry;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn failures_are_reported_with_message_type() {
        let telemetry = Arc::new(MemoryTelemetry::new());
        let tasks = DetachedTasks::new(telemetry.clone());

        tasks.spawn("GetFriends", "kernel:social", async {
            Err(anyhow::anyhow!("backend unavailable"))
        });
        tasks.settle().await;

        assert_eq!(
            telemetry.events(),
            vec![TelemetryEvent::HandlerFailed {
                message_type: "GetFriends".into(),
                context: "kernel:social".into(),
                error: "backend unavailable".into(),
            }]
        );
    }

    #[tokio::test]
    async fn panic_is_reported_even_after_its_handle_is_pruned() {
        let telemetry = Arc::new(MemoryTelemetry::new());
        let tasks = DetachedTasks::new(telemetry.clone());

        tasks.spawn("GetFriends", "kernel:social", async {
            panic!("collaborator blew up");
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Spawning again prunes the finished handle of the panicked task.
        tasks.spawn("GoTo", "kernel:teleport", async { Ok(()) });
        tasks.settle().await;

        assert_eq!(
            telemetry.events(),
            vec![TelemetryEvent::HandlerFailed {
                message_type: "GetFriends".into(),
                context: "kernel:social".into(),
                error: "handler panicked: collaborator blew up".into(),
            }]
        );
        assert_eq!(tasks.in_flight(), 0);
    }

    #[tokio::test]
    async fn settle_waits_for_all_work() {
        let telemetry = Arc::new(MemoryTelemetry::new());
        let tasks = DetachedTasks::new(telemetry.clone());
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            tasks.spawn("GoTo", "kernel:teleport", async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        tasks.settle().await;

        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.in_flight(), 0);
        assert!(telemetry.events().is_empty());
    }

    #[tokio::test]
    async fn pending_names_unfinished_work() {
        let telemetry = Arc::new(MemoryTelemetry::new());
        let tasks = DetachedTasks::new(telemetry.clone());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        tasks.spawn("JoinVoiceChat", "kernel:voice", async move {
            let _ = rx.await;
            Ok(())
        });

        assert_eq!(tasks.pending(), vec!["JoinVoiceChat (kernel:voice)".to_string()]);

        let _ = tx.send(());
        tasks.settle().await;
        assert!(tasks.pending().is_empty());
    }

    #[test]
    fn outside_a_runtime_the_work_is_reported_not_panicked() {
        let telemetry = Arc::new(MemoryTelemetry::new());
        let tasks = DetachedTasks::new(telemetry.clone());

        tasks.spawn("GoTo", "kernel:teleport", async { Ok(()) });

        assert_eq!(telemetry.of_type("handler_failed").len(), 1);
        assert_eq!(tasks.in_flight(), 0);
    }
}
