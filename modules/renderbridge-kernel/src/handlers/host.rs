//! Renderer lifecycle and browser-host messages.

use anyhow::Result;
use renderbridge_common::types::{
    BaseResolutionPayload, CrashPayload, EnabledPayload, EnsSearchPayload, GifRequestPayload,
    OpenUrlPayload, ReportLogPayload, SignedHeaderPayload, ValuePayload,
};
use renderbridge_common::TelemetryEvent;
use serde_json::{json, Value};
use tracing::{error, info, trace, warn};

use super::decode;
use crate::kernel::Kernel;
use crate::traits::GifRequest;

pub const AVATAR_LOADING_ERROR: &str = "Avatar loading error";

/// The renderer's first report after boot. Opens the `started` latch.
pub fn system_info_report(k: &Kernel, payload: Value) -> Result<()> {
    k.telemetry
        .record(TelemetryEvent::tracked("system info report", payload));
    k.started.open();
    Ok(())
}

pub fn crash_payload_response(k: &Kernel, payload: Value) -> Result<()> {
    let data: CrashPayload = decode("CrashPayloadResponse", payload)?;
    k.deps
        .renderer
        .crash_payload_response(json!({ "payload": data.payload }));
    Ok(())
}

pub fn open_web_url(k: &Kernel, payload: Value) -> Result<()> {
    let data: OpenUrlPayload = decode("OpenWebURL", payload)?;
    k.deps.host.open_url(data.url);
    Ok(())
}

pub fn set_base_resolution(k: &Kernel, payload: Value) -> Result<()> {
    let data: BaseResolutionPayload = decode("SetBaseResolution", payload)?;
    k.deps.renderer.set_target_height(data.base_resolution);
    Ok(())
}

pub fn update_memory_usage(k: &Kernel, _payload: Value) -> Result<()> {
    k.deps.renderer.send_memory_usage();
    Ok(())
}

pub fn request_gif_processor(k: &Kernel, payload: Value) -> Result<()> {
    let data: GifRequestPayload = decode("RequestGIFProcessor", payload)?;
    k.deps.host.process_gif(GifRequest {
        id: data.id,
        image_source: data.image_source,
        is_webgl1: data.is_webgl1,
    });
    Ok(())
}

pub fn delete_gif(k: &Kernel, payload: Value) -> Result<()> {
    let data: ValuePayload = decode("DeleteGIF", payload)?;
    k.deps.host.delete_gif(data.value);
    Ok(())
}

pub fn request_signed_header(k: &Kernel, payload: Value) -> Result<()> {
    let data: SignedHeaderPayload = decode("RequestSignedHeader", payload)?;
    k.deps
        .host
        .send_signed_headers(data.method, data.url, data.metadata);
    Ok(())
}

pub fn search_ens_owner(k: &Kernel, payload: Value) -> Result<()> {
    let data: EnsSearchPayload = decode("SearchENSOwner", payload)?;
    let host = k.deps.host.clone();
    k.tasks.spawn("SearchENSOwner", "kernel:web3", async move {
        host.search_ens_owner(data.name, data.max_results).await
    });
    Ok(())
}

pub fn fetch_balance_of_mana(k: &Kernel, _payload: Value) -> Result<()> {
    let host = k.deps.host.clone();
    k.tasks.spawn("FetchBalanceOfMANA", "kernel:web3", async move {
        host.fetch_balance_of_mana().await
    });
    Ok(())
}

pub fn notify_status_through_chat(k: &Kernel, payload: Value) -> Result<()> {
    let data: ValuePayload = decode("NotifyStatusThroughChat", payload)?;
    k.deps.host.notify_status_through_chat(data.value);
    Ok(())
}

pub fn report_avatar_fatal_error(k: &Kernel, payload: Value) -> Result<()> {
    error!(payload = %payload, "Renderer reported a fatal avatar error");
    k.deps
        .host
        .report_fatal_error(format!("{AVATAR_LOADING_ERROR} {payload}"), "renderer#avatars");
    Ok(())
}

/// Renderer log lines, re-emitted under the `renderer` target.
pub fn report_log(_k: &Kernel, payload: Value) -> Result<()> {
    let data: ReportLogPayload = decode("ReportLog", payload)?;
    let message = data.message.as_str();
    match data.level.as_str() {
        "trace" => trace!(target: "renderer", "{message}"),
        "warn" => warn!(target: "renderer", "{message}"),
        "error" => error!(target: "renderer", "{message}"),
        _ => info!(target: "renderer", "{message}"),
    }
    Ok(())
}

pub fn set_delighted_survey_enabled(k: &Kernel, payload: Value) -> Result<()> {
    let data: EnabledPayload = decode("SetDelightedSurveyEnabled", payload)?;
    k.deps.host.set_survey_enabled(data.enabled);
    Ok(())
}

pub fn start_isolated_mode(_k: &Kernel, _payload: Value) -> Result<()> {
    warn!("StartIsolatedMode");
    Ok(())
}

pub fn stop_isolated_mode(_k: &Kernel, _payload: Value) -> Result<()> {
    warn!("StopIsolatedMode");
    Ok(())
}
