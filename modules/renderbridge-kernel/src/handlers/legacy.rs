//! Messages kept for older renderer builds. Most only log; the router
//! reports every use of the deprecated ones.

use std::collections::HashMap;

use anyhow::Result;
use renderbridge_common::types::{ExpressionPayload, TrackPayload};
use renderbridge_common::TelemetryEvent;
use serde_json::Value;
use tracing::{debug, warn};

use super::decode;
use crate::kernel::Kernel;

pub fn performance_report(k: &Kernel, payload: Value) -> Result<()> {
    k.telemetry
        .record(TelemetryEvent::tracked("performance report", payload));
    Ok(())
}

/// Renderer-side analytics. Properties arrive as a key/value list and get a
/// `context` of `unity-event` unless they carry their own.
pub fn track(k: &Kernel, payload: Value) -> Result<()> {
    let data: TrackPayload = decode("Track", payload)?;
    let mut properties: HashMap<String, String> = data
        .properties
        .unwrap_or_default()
        .into_iter()
        .map(|kv| (kv.key, kv.value))
        .collect();
    properties
        .entry("context".to_string())
        .or_insert_with(|| "unity-event".to_string());

    k.telemetry.record(TelemetryEvent::tracked(
        data.name,
        serde_json::to_value(properties)?,
    ));
    Ok(())
}

pub fn trigger_expression(k: &Kernel, payload: Value) -> Result<()> {
    let data: ExpressionPayload = decode("TriggerExpression", payload)?;
    k.deps.world.broadcast_expression(data.id, data.timestamp);
    Ok(())
}

pub fn scenes_loading_feedback(_k: &Kernel, _payload: Value) -> Result<()> {
    debug!("Deprecated method: ScenesLoadingFeedback");
    Ok(())
}

/// Accepted and dropped.
pub fn ignored(_k: &Kernel, _payload: Value) -> Result<()> {
    Ok(())
}

/// Builder-in-world requests; the builder is no longer served here.
pub fn builder_request(_k: &Kernel, payload: Value) -> Result<()> {
    warn!(payload = %payload, "Builder request ignored");
    Ok(())
}

pub fn publish_scene_state(_k: &Kernel, payload: Value) -> Result<()> {
    warn!(payload = %payload, "PublishSceneState");
    Ok(())
}
