//! Renderer answers to pending calls.
//!
//! Each message carries the id the kernel handed out with the request.
//! Unknown or already-settled ids are reported by the registry and
//! otherwise ignored.

use anyhow::Result;
use renderbridge_common::types::{
    CameraTargetReply, MousePositionReply, ScreenshotReply, Web3UseReply,
};
use renderbridge_engine::CallId;
use serde_json::Value;

use super::decode;
use crate::kernel::Kernel;

pub fn report_mouse_position(k: &Kernel, payload: Value) -> Result<()> {
    let reply: MousePositionReply = decode("ReportMousePosition", payload)?;
    k.calls
        .resolve(&CallId::from(reply.id), reply.mouse_position);
    Ok(())
}

pub fn send_screenshot(k: &Kernel, payload: Value) -> Result<()> {
    let reply: ScreenshotReply = decode("SendScreenshot", payload)?;
    k.calls.resolve(
        &CallId::from(reply.id),
        Value::String(reply.encoded_texture),
    );
    Ok(())
}

pub fn report_builder_camera_target(k: &Kernel, payload: Value) -> Result<()> {
    let reply: CameraTargetReply = decode("ReportBuilderCameraTarget", payload)?;
    k.calls
        .resolve(&CallId::from(reply.id), reply.camera_target);
    Ok(())
}

pub fn web3_use_response(k: &Kernel, payload: Value) -> Result<()> {
    let reply: Web3UseReply = decode("Web3UseResponse", payload)?;
    let id = CallId::from(reply.id);
    if reply.result {
        k.calls.resolve(&id, Value::Bool(true));
    } else {
        k.calls.reject(&id, "Web3 operation rejected");
    }
    Ok(())
}
