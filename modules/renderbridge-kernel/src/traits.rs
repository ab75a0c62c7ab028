// Collaborator abstractions for renderer message handlers.
//
// Handlers are thin adapters: decode the payload, then make one call on one
// of these. Everything with real behaviour (state reduction, backend RPCs,
// teleport orchestration, transport back to the renderer) lives behind a
// trait so the kernel can be exercised with recording doubles.

use anyhow::Result;
use async_trait::async_trait;
use renderbridge_common::types::{Parcel, Quaternion, SceneEventPayload, SceneRef, VideoEvent};
use renderbridge_common::{StoreAction, Vector3};
use serde::Serialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// The slice of session state handlers read before deciding what to do.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub user_id: Option<String>,
    pub has_wallet: bool,
}

pub trait StateStore: Send + Sync {
    fn dispatch(&self, action: StoreAction);

    fn session(&self) -> SessionSnapshot;
}

// ---------------------------------------------------------------------------
// FriendsService
// ---------------------------------------------------------------------------

/// Social backend. Each call fetches from the backend and pushes results to
/// the renderer itself; requests are forwarded as the renderer sent them.
#[async_trait]
pub trait FriendsService: Send + Sync {
    async fn get_friends(&self, request: Value) -> Result<()>;

    async fn get_friend_requests(&self, request: Value) -> Result<()>;

    async fn mark_private_messages_seen(&self, user_id: String) -> Result<()>;

    async fn get_private_messages(&self, request: Value) -> Result<()>;

    async fn get_unseen_messages_by_user(&self) -> Result<()>;

    async fn get_friends_with_direct_messages(&self, request: Value) -> Result<()>;

    async fn update_friendship_status(&self, message: Value) -> Result<()>;
}

// ---------------------------------------------------------------------------
// ChannelsService
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ChannelsService: Send + Sync {
    async fn create_channel(&self, request: Value) -> Result<()>;

    async fn join_channel(&self, request: Value) -> Result<()>;

    async fn mark_channel_messages_seen(&self, channel_id: String) -> Result<()>;

    async fn get_channel_messages(&self, request: Value) -> Result<()>;

    async fn search_channels(&self, request: Value) -> Result<()>;

    async fn get_channel_members(&self, request: Value) -> Result<()>;

    async fn get_unseen_messages_by_channel(&self) -> Result<()>;

    async fn get_joined_channels(&self, request: Value) -> Result<()>;

    async fn mute_channel(&self, request: Value) -> Result<()>;

    async fn get_channel_info(&self, request: Value) -> Result<()>;
}

// ---------------------------------------------------------------------------
// TeleportService
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TeleportService: Send + Sync {
    /// Announce the jump in chat and teleport to `parcel`.
    async fn go_to(&self, parcel: Parcel) -> Result<()>;

    async fn go_to_crowd(&self) -> Result<()>;

    /// Teleport to a position in a specific realm.
    async fn jump_in(&self, position: Value) -> Result<()>;

    fn loading_hud_ready_for_teleport(&self, parcel: Parcel);
}

// ---------------------------------------------------------------------------
// WorldService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    pub position: Vector3,
    pub rotation: Quaternion,
    pub camera_rotation: Quaternion,
    pub player_height: f64,
    pub immediate: bool,
}

/// Scene runtime and world-level state outside the store.
#[async_trait]
pub trait WorldService: Send + Sync {
    fn receive_position_report(&self, report: PositionReport);

    fn all_scenes_event(&self, event_type: String, payload: Value);

    fn scene_event(&self, event: SceneEventPayload) -> Result<()>;

    /// Id of the loaded scene with this number, if any.
    fn scene_id_for_number(&self, scene_number: i64) -> Option<String>;

    /// Deliver a video event to a scene. `false` when the scene is not loaded.
    fn send_video_event(&self, scene: &SceneRef, event: VideoEvent) -> bool;

    fn set_renderer_avatar_state(&self, state: Value);

    fn set_world_time(&self, time: Value);

    /// Broadcast a player expression to every scene and to nearby players.
    fn broadcast_expression(&self, expression_id: String, timestamp: f64);

    async fn report_hot_scenes(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// HostServices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GifRequest {
    pub id: String,
    pub image_source: String,
    pub is_webgl1: bool,
}

/// Browser-host facilities: navigation, chat notices, profiles, audio,
/// web3 lookups and fatal-error reporting.
#[async_trait]
pub trait HostServices: Send + Sync {
    fn open_url(&self, url: String);

    fn notify_status_through_chat(&self, text: String);

    fn report_fatal_error(&self, message: String, context: &'static str);

    fn set_survey_enabled(&self, enabled: bool);

    /// Sign `url` with the current identity and hand the headers to the
    /// renderer. Unsigned (empty) when there is no identity.
    fn send_signed_headers(&self, method: String, url: String, metadata: Value);

    fn process_gif(&self, request: GifRequest);

    fn delete_gif(&self, id: String);

    async fn save_user_avatar(&self, changes: Value) -> Result<()>;

    async fn retrieve_profile(&self, user_id: String) -> Result<()>;

    async fn set_audio_stream(&self, url: String, play: bool, volume: f64) -> Result<()>;

    async fn request_audio_devices(&self) -> Result<()>;

    async fn search_ens_owner(&self, name: String, max_results: Option<u32>) -> Result<()>;

    async fn fetch_balance_of_mana(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// RendererOutbound
// ---------------------------------------------------------------------------

/// Kernel → renderer direction for the few messages answered directly.
pub trait RendererOutbound: Send + Sync {
    fn crash_payload_response(&self, payload: Value);

    fn send_memory_usage(&self);

    fn set_target_height(&self, height: u32);
}
