//! Voice chat and audio device messages.

use anyhow::Result;
use renderbridge_common::types::{
    AudioDevicePayload, AudioStreamPayload, RecordingPayload, VoiceSettingsPayload,
};
use renderbridge_common::StoreAction;
use serde_json::Value;

use super::decode;
use crate::kernel::Kernel;

pub fn set_voice_chat_recording(k: &Kernel, payload: Value) -> Result<()> {
    let data: RecordingPayload = decode("SetVoiceChatRecording", payload)?;
    k.deps
        .store
        .dispatch(StoreAction::RequestVoiceChatRecording {
            recording: data.recording,
        });
    Ok(())
}

/// Browsers refuse audio capture before a user gesture, so joining waits
/// for the host to report one.
pub fn join_voice_chat(k: &Kernel, _payload: Value) -> Result<()> {
    let interaction = k.user_interaction.clone();
    let store = k.deps.store.clone();
    k.tasks.spawn("JoinVoiceChat", "kernel:voice", async move {
        interaction.wait().await;
        store.dispatch(StoreAction::JoinVoiceChat);
        Ok(())
    });
    Ok(())
}

pub fn leave_voice_chat(k: &Kernel, _payload: Value) -> Result<()> {
    k.deps.store.dispatch(StoreAction::LeaveVoiceChat);
    Ok(())
}

pub fn toggle_voice_chat_recording(k: &Kernel, _payload: Value) -> Result<()> {
    k.deps
        .store
        .dispatch(StoreAction::RequestToggleVoiceChatRecording);
    Ok(())
}

pub fn apply_settings(k: &Kernel, payload: Value) -> Result<()> {
    let data: VoiceSettingsPayload = decode("ApplySettings", payload)?;
    k.deps.store.dispatch(StoreAction::ApplyVoiceChatSettings {
        volume: data.voice_chat_volume,
        allow_category: data.voice_chat_allow_category,
    });
    Ok(())
}

pub fn set_input_audio_device(k: &Kernel, payload: Value) -> Result<()> {
    let data: AudioDevicePayload = decode("SetInputAudioDevice", payload)?;
    k.deps.store.dispatch(StoreAction::SetAudioDevice {
        input_device_id: data.device_id,
    });
    Ok(())
}

pub fn request_audio_devices(k: &Kernel, _payload: Value) -> Result<()> {
    let host = k.deps.host.clone();
    k.tasks.spawn("RequestAudioDevices", "kernel:voice", async move {
        host.request_audio_devices().await
    });
    Ok(())
}

pub fn set_audio_stream(k: &Kernel, payload: Value) -> Result<()> {
    let data: AudioStreamPayload = decode("SetAudioStream", payload)?;
    let host = k.deps.host.clone();
    k.tasks.spawn("SetAudioStream", "kernel:voice", async move {
        host.set_audio_stream(data.url, data.play, data.volume).await
    });
    Ok(())
}
