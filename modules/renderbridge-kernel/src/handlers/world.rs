//! World, scene and teleport messages.

use anyhow::{anyhow, Result};
use renderbridge_common::types::{
    AllScenesEventPayload, ControlEventPayload, DisablePortableExperiencesPayload,
    HomeScenePayload, Parcel, PortableExperiencePayload, ReportPositionPayload,
    SceneEventPayload, SceneRef, ScenesInAreaPayload, ScenesLoadRadiusPayload,
    TermsOfServicePayload, VideoEvent, VideoProgressPayload, DEFAULT_PLAYER_HEIGHT,
};
use renderbridge_common::{StoreAction, TelemetryEvent};
use serde_json::Value;
use tracing::{error, warn};

use super::decode;
use super::social::REPORT_URL;
use crate::kernel::Kernel;
use crate::traits::PositionReport;

pub fn report_position(k: &Kernel, payload: Value) -> Result<()> {
    let data: ReportPositionPayload = decode("ReportPosition", payload)?;
    k.deps.world.receive_position_report(PositionReport {
        position: data.position,
        rotation: data.rotation,
        camera_rotation: data.camera_rotation.unwrap_or(data.rotation),
        player_height: data
            .player_height
            .filter(|h| *h != 0.0)
            .unwrap_or(DEFAULT_PLAYER_HEIGHT),
        immediate: data.immediate.unwrap_or(false),
    });
    Ok(())
}

pub fn all_scenes_event(k: &Kernel, payload: Value) -> Result<()> {
    let data: AllScenesEventPayload = decode("AllScenesEvent", payload)?;
    k.deps.world.all_scenes_event(data.event_type, data.payload);
    Ok(())
}

pub fn scene_event(k: &Kernel, payload: Value) -> Result<()> {
    let data: SceneEventPayload = decode("SceneEvent", payload)?;
    k.deps.world.scene_event(data)
}

pub fn go_to(k: &Kernel, payload: Value) -> Result<()> {
    let parcel: Parcel = decode("GoTo", payload)?;
    let teleport = k.deps.teleport.clone();
    k.tasks.spawn("GoTo", "kernel:teleport", async move {
        teleport.go_to(parcel).await
    });
    Ok(())
}

/// Shared by `GoToCrowd` and its older alias `GoToMagic`.
pub fn go_to_crowd(k: &Kernel, _payload: Value) -> Result<()> {
    let teleport = k.deps.teleport.clone();
    k.tasks.spawn("GoToCrowd", "kernel:teleport", async move {
        teleport.go_to_crowd().await
    });
    Ok(())
}

pub fn jump_in(k: &Kernel, payload: Value) -> Result<()> {
    let teleport = k.deps.teleport.clone();
    k.tasks.spawn("JumpIn", "kernel:teleport", async move {
        teleport.jump_in(payload).await
    });
    Ok(())
}

pub fn loading_hud_ready_for_teleport(k: &Kernel, payload: Value) -> Result<()> {
    let parcel: Parcel = decode("LoadingHUDReadyForTeleport", payload)?;
    k.deps.teleport.loading_hud_ready_for_teleport(parcel);
    Ok(())
}

/// Radius is rounded and never below one parcel.
pub fn set_scenes_load_radius(k: &Kernel, payload: Value) -> Result<()> {
    let data: ScenesLoadRadiusPayload = decode("SetScenesLoadRadius", payload)?;
    let radius = data.new_radius.round().max(1.0) as u32;
    k.deps
        .store
        .dispatch(StoreAction::SetWorldLoadingRadius { radius });
    Ok(())
}

/// Coordinates win over scene id when both are present.
pub fn set_home_scene(k: &Kernel, payload: Value) -> Result<()> {
    let data: HomeScenePayload = decode("SetHomeScene", payload)?;
    let position = data
        .scene_coords
        .filter(|coords| !coords.is_empty())
        .or(data.scene_id)
        .ok_or_else(|| anyhow!("SetHomeScene without sceneCoords or sceneId"))?;
    k.deps.store.dispatch(StoreAction::SetHomeScene { position });
    Ok(())
}

pub fn request_scenes_info_in_area(k: &Kernel, payload: Value) -> Result<()> {
    let data: ScenesInAreaPayload = decode("RequestScenesInfoInArea", payload)?;
    k.deps.store.dispatch(StoreAction::ReportScenesAroundParcel {
        parcel: data.parcel,
        scenes_around: data.scenes_around,
    });
    Ok(())
}

pub fn report_scene(k: &Kernel, payload: Value) -> Result<()> {
    let scene: SceneRef = decode("ReportScene", payload)?;
    let number = scene.number();
    let scene_id = scene
        .scene_id
        .or_else(|| number.and_then(|n| k.deps.world.scene_id_for_number(n)))
        .ok_or_else(|| anyhow!("ReportScene for a scene that is not loaded"))?;
    k.deps.host.open_url(format!("{REPORT_URL}{scene_id}"));
    Ok(())
}

pub fn control_event(k: &Kernel, payload: Value) -> Result<()> {
    let event: ControlEventPayload = decode("ControlEvent", payload)?;
    match event.event_type.as_str() {
        "SceneReady" => {
            let scene: SceneRef = decode("ControlEvent", event.payload)?;
            k.deps.store.dispatch(StoreAction::RendererSignalSceneReady {
                scene_id: scene.scene_id,
                scene_number: scene.scene_number,
            });
        }
        other => {
            warn!(event_type = other, "Unknown control event type, ignoring");
        }
    }
    Ok(())
}

pub fn video_progress_event(k: &Kernel, payload: Value) -> Result<()> {
    let data: VideoProgressPayload = decode("VideoProgressEvent", payload)?;
    let scene = SceneRef {
        scene_id: data.scene_id,
        scene_number: data.scene_number,
    };
    let event = VideoEvent {
        component_id: data.component_id,
        video_clip_id: data.video_texture_id,
        video_status: data.status,
        current_offset: data.current_offset,
        total_video_length: data.video_length,
    };

    if !k.deps.world.send_video_event(&scene, event) {
        match (scene.number(), scene.scene_id.as_deref()) {
            (Some(number), _) => {
                error!(scene_number = number, "Video progress for a scene that is not loaded")
            }
            (None, Some(id)) => {
                error!(scene_id = id, "Video progress for a scene that is not loaded")
            }
            (None, None) => error!("Video progress without a scene reference"),
        }
    }
    Ok(())
}

pub fn report_avatar_state(k: &Kernel, payload: Value) -> Result<()> {
    k.deps.world.set_renderer_avatar_state(payload);
    Ok(())
}

pub fn report_world_time(k: &Kernel, payload: Value) -> Result<()> {
    k.deps.world.set_world_time(payload);
    Ok(())
}

pub fn fetch_hot_scenes(k: &Kernel, _payload: Value) -> Result<()> {
    let world = k.deps.world.clone();
    k.tasks.spawn("FetchHotScenes", "kernel:world", async move {
        world.report_hot_scenes().await
    });
    Ok(())
}

/// Tracked as analytics, with the scene id filled in from the scene number
/// when the renderer only sent the number.
pub fn terms_of_service_response(k: &Kernel, payload: Value) -> Result<()> {
    let mut data: TermsOfServicePayload = decode("TermsOfServiceResponse", payload)?;
    if let Some(number) = data.scene_number.filter(|n| *n != 0) {
        if let Some(scene_id) = k.deps.world.scene_id_for_number(number) {
            data.scene_id = Some(scene_id);
        }
    }
    k.telemetry.record(TelemetryEvent::tracked(
        "TermsOfServiceResponse",
        serde_json::to_value(&data)?,
    ));
    Ok(())
}

pub fn kill_portable_experience(k: &Kernel, payload: Value) -> Result<()> {
    let data: PortableExperiencePayload = decode("KillPortableExperience", payload)?;
    k.deps
        .store
        .dispatch(StoreAction::RemoveScenePortableExperience {
            portable_experience_id: data.portable_experience_id,
        });
    Ok(())
}

pub fn set_disabled_portable_experiences(k: &Kernel, payload: Value) -> Result<()> {
    let data: DisablePortableExperiencesPayload =
        decode("SetDisabledPortableExperiences", payload)?;
    k.deps.store.dispatch(StoreAction::DenyPortableExperiences {
        ids: data.ids_to_disable,
    });
    Ok(())
}
