//! Replay a recorded renderer session through a fully-wired kernel.
//!
//! Input is NDJSON, one `{"type": ..., "payload": ...}` envelope per line.
//! Every collaborator is a recording double, so the report shows what the
//! kernel would have done against a real client.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use renderbridge_common::{Config, StoreAction, TelemetryEvent};
use renderbridge_engine::{FanoutSink, MemoryTelemetry, Outcome, TelemetrySink, TracingSink};
use serde::Serialize;
use tracing::{info, warn};

use crate::kernel::{build_router, KernelDeps};
use crate::recording::{RecordingServices, RecordingStore, ServiceCall};

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Treat the session as having had a user gesture before the first
    /// message. Without one, voice chat joins never complete.
    pub user_interaction: bool,
    /// How long to wait for detached work before reporting anyway.
    pub settle_timeout: Duration,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            user_interaction: true,
            settle_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: BTreeMap<&'static str, usize>,
    pub actions: Vec<StoreAction>,
    pub calls: Vec<ServiceCall>,
    pub telemetry: Vec<TelemetryEvent>,
    /// Detached work still running when the settle timeout expired.
    pub unfinished: Vec<String>,
}

pub async fn replay<R: BufRead>(
    reader: R,
    config: &Config,
    options: &ReplayOptions,
) -> Result<ReplayReport> {
    let store = Arc::new(RecordingStore::new());
    let services = Arc::new(RecordingServices::new());
    let memory = Arc::new(MemoryTelemetry::new());
    let logged: Arc<dyn TelemetrySink> = Arc::new(TracingSink);
    let recorded: Arc<dyn TelemetrySink> = memory.clone();
    let telemetry = Arc::new(FanoutSink::new(vec![logged, recorded]));

    let deps = KernelDeps {
        store: store.clone(),
        friends: services.clone(),
        channels: services.clone(),
        teleport: services.clone(),
        world: services.clone(),
        host: services.clone(),
        renderer: services.clone(),
    };
    let router = build_router(deps, config, telemetry)?;
    info!(routes = router.table().len(), "Kernel ready");

    if options.user_interaction {
        router.context().signal_user_interaction();
    }

    let started_at = Utc::now();
    let mut outcomes: BTreeMap<&'static str, usize> = BTreeMap::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("reading renderer messages")?;
        if line.trim().is_empty() {
            continue;
        }
        let outcome = router.handle_raw(&line);
        if outcome == Outcome::Malformed {
            warn!(line = index + 1, "Skipped malformed envelope");
        }
        *outcomes.entry(outcome_label(&outcome)).or_default() += 1;
    }

    let tasks = router.context().tasks();
    let unfinished = match tokio::time::timeout(options.settle_timeout, tasks.settle()).await {
        Ok(()) => Vec::new(),
        Err(_) => {
            let pending = tasks.pending();
            warn!(
                timeout_secs = options.settle_timeout.as_secs_f64(),
                pending = ?pending,
                "Detached work still running, reporting without it"
            );
            pending
        }
    };

    Ok(ReplayReport {
        started_at,
        finished_at: Utc::now(),
        outcomes,
        actions: store.actions(),
        calls: services.calls(),
        telemetry: memory.events(),
        unfinished,
    })
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Handled => "handled",
        Outcome::Gated { .. } => "gated",
        Outcome::Unknown => "unknown",
        Outcome::Failed => "failed",
        Outcome::Malformed => "malformed",
    }
}
