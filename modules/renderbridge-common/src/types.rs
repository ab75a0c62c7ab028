//! Wire shapes of renderer messages.
//!
//! Payloads arrive untyped; each handler decodes the one it needs. Field
//! names follow the renderer's camelCase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound envelope: `{"type": "...", "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl RendererMessage {
    pub fn new(message_type: impl Into<String>, payload: Value) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Parcel {
    pub x: i32,
    pub y: i32,
}

/// Default avatar eye height when the renderer omits one.
pub const DEFAULT_PLAYER_HEIGHT: f64 = 1.6;

/// Correlation id of a pending call, as carried in `id` fields.
pub type CallIdRef = String;

// ---------------------------------------------------------------------------
// Session and profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PassportPayload {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnverifiedNamePayload {
    pub new_unverified_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionPayload {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialStepPayload {
    pub tutorial_step: i64,
}

/// `{"value": "..."}`, used by several single-string messages.
#[derive(Debug, Clone, Deserialize)]
pub struct ValuePayload {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRef {
    pub channel_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuteUsersPayload {
    pub users_id: Vec<String>,
    pub mute: bool,
}

// ---------------------------------------------------------------------------
// World and scenes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPositionPayload {
    pub position: Vector3,
    pub rotation: Quaternion,
    #[serde(default)]
    pub player_height: Option<f64>,
    #[serde(default)]
    pub immediate: Option<bool>,
    #[serde(default)]
    pub camera_rotation: Option<Quaternion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEventPayload {
    #[serde(default)]
    pub scene_id: Option<String>,
    #[serde(default)]
    pub scene_number: Option<i64>,
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllScenesEventPayload {
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlEventPayload {
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
}

/// Identifies a scene by id, number, or both. A zero scene number means
/// "not given".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRef {
    #[serde(default)]
    pub scene_id: Option<String>,
    #[serde(default)]
    pub scene_number: Option<i64>,
}

impl SceneRef {
    pub fn number(&self) -> Option<i64> {
        self.scene_number.filter(|n| *n != 0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsOfServicePayload {
    #[serde(default)]
    pub scene_id: Option<String>,
    #[serde(default)]
    pub scene_number: Option<i64>,
    pub accepted: bool,
    #[serde(default)]
    pub dont_show_again: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenesLoadRadiusPayload {
    pub new_radius: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeScenePayload {
    #[serde(default)]
    pub scene_id: Option<String>,
    #[serde(default)]
    pub scene_coords: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenesInAreaPayload {
    pub parcel: Parcel,
    pub scenes_around: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoProgressPayload {
    pub component_id: String,
    #[serde(default)]
    pub scene_id: Option<String>,
    #[serde(default)]
    pub scene_number: Option<i64>,
    pub video_texture_id: String,
    pub status: i64,
    pub current_offset: f64,
    pub video_length: f64,
}

/// The scene-facing shape of a video progress notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEvent {
    pub component_id: String,
    pub video_clip_id: String,
    pub video_status: i64,
    pub current_offset: f64,
    pub total_video_length: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortableExperiencePayload {
    pub portable_experience_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisablePortableExperiencesPayload {
    pub ids_to_disable: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pending-call replies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MousePositionReply {
    pub id: CallIdRef,
    pub mouse_position: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotReply {
    pub id: CallIdRef,
    pub encoded_texture: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraTargetReply {
    pub id: CallIdRef,
    pub camera_target: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Web3UseReply {
    pub id: CallIdRef,
    pub result: bool,
}

// ---------------------------------------------------------------------------
// Voice and audio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDevicePayload {
    pub device_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordingPayload {
    pub recording: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSettingsPayload {
    pub voice_chat_volume: f64,
    pub voice_chat_allow_category: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioStreamPayload {
    pub url: String,
    pub play: bool,
    pub volume: f64,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalogFilters {
    #[serde(default)]
    pub owned_by_user: Option<String>,
    #[serde(default, alias = "emoteIds")]
    pub wearable_ids: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub collection_ids: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub third_party_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRequestPayload {
    pub filters: RawCatalogFilters,
    #[serde(default)]
    pub context: Option<String>,
}

/// Filters handed to the catalog, with absent and empty entries dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_by_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub third_party_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_ids: Option<Vec<String>>,
}

impl From<RawCatalogFilters> for CatalogFilters {
    fn from(raw: RawCatalogFilters) -> Self {
        Self {
            owned_by_user: raw.owned_by_user,
            third_party_id: raw.third_party_id,
            item_ids: clean_ids(raw.wearable_ids),
            collection_ids: clean_ids(raw.collection_ids),
        }
    }
}

/// Drop null and empty entries; an empty result becomes `None`.
pub fn clean_ids(ids: Option<Vec<Option<String>>>) -> Option<Vec<String>> {
    let cleaned: Vec<String> = ids?
        .into_iter()
        .flatten()
        .filter(|id| !id.is_empty())
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

// ---------------------------------------------------------------------------
// Renderer and host
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OpenUrlPayload {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPayload {
    pub name: String,
    #[serde(default)]
    pub properties: Option<Vec<KeyValue>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpressionPayload {
    pub id: String,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResolutionPayload {
    pub base_resolution: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GifRequestPayload {
    pub image_source: String,
    pub id: String,
    #[serde(rename = "isWebGL1", default)]
    pub is_webgl1: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignedHeaderPayload {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsSearchPayload {
    pub name: String,
    #[serde(default)]
    pub max_results: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnabledPayload {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrashPayload {
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportLogPayload {
    #[serde(rename = "type")]
    pub level: String,
    pub message: String,
}
