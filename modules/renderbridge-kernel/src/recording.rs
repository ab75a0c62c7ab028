//! Recording collaborators.
//!
//! `RecordingStore` keeps every dispatched action; `RecordingServices`
//! implements every service trait by logging and recording the call. The
//! replay binary runs a kernel against these, and tests assert on them.
//! Individual service methods can be made to fail to exercise error paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{bail, Result};
use async_trait::async_trait;
use renderbridge_common::types::{Parcel, SceneEventPayload, SceneRef, VideoEvent};
use renderbridge_common::StoreAction;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::traits::{
    ChannelsService, FriendsService, GifRequest, HostServices, PositionReport, RendererOutbound,
    SessionSnapshot, StateStore, TeleportService, WorldService,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// RecordingStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingStore {
    actions: Mutex<Vec<StoreAction>>,
    session: Mutex<SessionSnapshot>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: SessionSnapshot) -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            session: Mutex::new(session),
        }
    }

    pub fn set_session(&self, session: SessionSnapshot) {
        *lock(&self.session) = session;
    }

    /// Every dispatched action, in order.
    pub fn actions(&self) -> Vec<StoreAction> {
        lock(&self.actions).clone()
    }
}

impl StateStore for RecordingStore {
    fn dispatch(&self, action: StoreAction) {
        debug!(action = action.action_type(), "Store dispatch");
        lock(&self.actions).push(action);
    }

    fn session(&self) -> SessionSnapshot {
        lock(&self.session).clone()
    }
}

// ---------------------------------------------------------------------------
// RecordingServices
// ---------------------------------------------------------------------------

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCall {
    pub service: &'static str,
    pub method: &'static str,
    pub args: Value,
}

#[derive(Debug, Default)]
pub struct RecordingServices {
    calls: Mutex<Vec<ServiceCall>>,
    failing: Mutex<HashSet<&'static str>>,
    scenes: Mutex<HashMap<i64, String>>,
}

impl RecordingServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `method` fail after it is recorded.
    pub fn fail(&self, method: &'static str) {
        lock(&self.failing).insert(method);
    }

    /// Register a loaded scene for number → id lookups.
    pub fn load_scene(&self, scene_number: i64, scene_id: impl Into<String>) {
        lock(&self.scenes).insert(scene_number, scene_id.into());
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        lock(&self.calls).clone()
    }

    /// Calls to one method, by name.
    pub fn calls_to(&self, method: &str) -> Vec<ServiceCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    fn record(&self, service: &'static str, method: &'static str, args: Value) {
        debug!(service, method, args = %args, "Collaborator call");
        lock(&self.calls).push(ServiceCall {
            service,
            method,
            args,
        });
    }

    fn record_fallible(&self, service: &'static str, method: &'static str, args: Value) -> Result<()> {
        self.record(service, method, args);
        if lock(&self.failing).contains(method) {
            bail!("{service}.{method} failed");
        }
        Ok(())
    }

    fn scene_loaded(&self, scene: &SceneRef) -> bool {
        let scenes = lock(&self.scenes);
        match (scene.number(), scene.scene_id.as_deref()) {
            (Some(number), _) => scenes.contains_key(&number),
            (None, Some(id)) => scenes.values().any(|loaded| loaded == id),
            (None, None) => false,
        }
    }
}

#[async_trait]
impl FriendsService for RecordingServices {
    async fn get_friends(&self, request: Value) -> Result<()> {
        self.record_fallible("friends", "get_friends", request)
    }

    async fn get_friend_requests(&self, request: Value) -> Result<()> {
        self.record_fallible("friends", "get_friend_requests", request)
    }

    async fn mark_private_messages_seen(&self, user_id: String) -> Result<()> {
        self.record_fallible("friends", "mark_private_messages_seen", json!(user_id))
    }

    async fn get_private_messages(&self, request: Value) -> Result<()> {
        self.record_fallible("friends", "get_private_messages", request)
    }

    async fn get_unseen_messages_by_user(&self) -> Result<()> {
        self.record_fallible("friends", "get_unseen_messages_by_user", Value::Null)
    }

    async fn get_friends_with_direct_messages(&self, request: Value) -> Result<()> {
        self.record_fallible("friends", "get_friends_with_direct_messages", request)
    }

    async fn update_friendship_status(&self, message: Value) -> Result<()> {
        self.record_fallible("friends", "update_friendship_status", message)
    }
}

#[async_trait]
impl ChannelsService for RecordingServices {
    async fn create_channel(&self, request: Value) -> Result<()> {
        self.record_fallible("channels", "create_channel", request)
    }

    async fn join_channel(&self, request: Value) -> Result<()> {
        self.record_fallible("channels", "join_channel", request)
    }

    async fn mark_channel_messages_seen(&self, channel_id: String) -> Result<()> {
        self.record_fallible("channels", "mark_channel_messages_seen", json!(channel_id))
    }

    async fn get_channel_messages(&self, request: Value) -> Result<()> {
        self.record_fallible("channels", "get_channel_messages", request)
    }

    async fn search_channels(&self, request: Value) -> Result<()> {
        self.record_fallible("channels", "search_channels", request)
    }

    async fn get_channel_members(&self, request: Value) -> Result<()> {
        self.record_fallible("channels", "get_channel_members", request)
    }

    async fn get_unseen_messages_by_channel(&self) -> Result<()> {
        self.record_fallible("channels", "get_unseen_messages_by_channel", Value::Null)
    }

    async fn get_joined_channels(&self, request: Value) -> Result<()> {
        self.record_fallible("channels", "get_joined_channels", request)
    }

    async fn mute_channel(&self, request: Value) -> Result<()> {
        self.record_fallible("channels", "mute_channel", request)
    }

    async fn get_channel_info(&self, request: Value) -> Result<()> {
        self.record_fallible("channels", "get_channel_info", request)
    }
}

#[async_trait]
impl TeleportService for RecordingServices {
    async fn go_to(&self, parcel: Parcel) -> Result<()> {
        self.record_fallible("teleport", "go_to", json!(parcel))
    }

    async fn go_to_crowd(&self) -> Result<()> {
        self.record_fallible("teleport", "go_to_crowd", Value::Null)
    }

    async fn jump_in(&self, position: Value) -> Result<()> {
        self.record_fallible("teleport", "jump_in", position)
    }

    fn loading_hud_ready_for_teleport(&self, parcel: Parcel) {
        self.record("teleport", "loading_hud_ready_for_teleport", json!(parcel));
    }
}

#[async_trait]
impl WorldService for RecordingServices {
    fn receive_position_report(&self, report: PositionReport) {
        self.record("world", "receive_position_report", json!(report));
    }

    fn all_scenes_event(&self, event_type: String, payload: Value) {
        self.record(
            "world",
            "all_scenes_event",
            json!({ "eventType": event_type, "payload": payload }),
        );
    }

    fn scene_event(&self, event: SceneEventPayload) -> Result<()> {
        self.record_fallible(
            "world",
            "scene_event",
            json!({
                "sceneId": event.scene_id,
                "sceneNumber": event.scene_number,
                "eventType": event.event_type,
                "payload": event.payload,
            }),
        )
    }

    fn scene_id_for_number(&self, scene_number: i64) -> Option<String> {
        lock(&self.scenes).get(&scene_number).cloned()
    }

    fn send_video_event(&self, scene: &SceneRef, event: VideoEvent) -> bool {
        if !self.scene_loaded(scene) {
            return false;
        }
        self.record("world", "send_video_event", json!(event));
        true
    }

    fn set_renderer_avatar_state(&self, state: Value) {
        self.record("world", "set_renderer_avatar_state", state);
    }

    fn set_world_time(&self, time: Value) {
        self.record("world", "set_world_time", time);
    }

    fn broadcast_expression(&self, expression_id: String, timestamp: f64) {
        self.record(
            "world",
            "broadcast_expression",
            json!({ "expressionId": expression_id, "timestamp": timestamp }),
        );
    }

    async fn report_hot_scenes(&self) -> Result<()> {
        self.record_fallible("world", "report_hot_scenes", Value::Null)
    }
}

#[async_trait]
impl HostServices for RecordingServices {
    fn open_url(&self, url: String) {
        self.record("host", "open_url", json!(url));
    }

    fn notify_status_through_chat(&self, text: String) {
        self.record("host", "notify_status_through_chat", json!(text));
    }

    fn report_fatal_error(&self, message: String, context: &'static str) {
        self.record(
            "host",
            "report_fatal_error",
            json!({ "message": message, "context": context }),
        );
    }

    fn set_survey_enabled(&self, enabled: bool) {
        self.record("host", "set_survey_enabled", json!(enabled));
    }

    fn send_signed_headers(&self, method: String, url: String, metadata: Value) {
        self.record(
            "host",
            "send_signed_headers",
            json!({ "method": method, "url": url, "metadata": metadata }),
        );
    }

    fn process_gif(&self, request: GifRequest) {
        self.record("host", "process_gif", json!(request));
    }

    fn delete_gif(&self, id: String) {
        self.record("host", "delete_gif", json!(id));
    }

    async fn save_user_avatar(&self, changes: Value) -> Result<()> {
        self.record_fallible("host", "save_user_avatar", changes)
    }

    async fn retrieve_profile(&self, user_id: String) -> Result<()> {
        self.record_fallible("host", "retrieve_profile", json!(user_id))
    }

    async fn set_audio_stream(&self, url: String, play: bool, volume: f64) -> Result<()> {
        self.record_fallible(
            "host",
            "set_audio_stream",
            json!({ "url": url, "play": play, "volume": volume }),
        )
    }

    async fn request_audio_devices(&self) -> Result<()> {
        self.record_fallible("host", "request_audio_devices", Value::Null)
    }

    async fn search_ens_owner(&self, name: String, max_results: Option<u32>) -> Result<()> {
        self.record_fallible(
            "host",
            "search_ens_owner",
            json!({ "name": name, "maxResults": max_results }),
        )
    }

    async fn fetch_balance_of_mana(&self) -> Result<()> {
        self.record_fallible("host", "fetch_balance_of_mana", Value::Null)
    }
}

impl RendererOutbound for RecordingServices {
    fn crash_payload_response(&self, payload: Value) {
        self.record("renderer", "crash_payload_response", payload);
    }

    fn send_memory_usage(&self) {
        self.record("renderer", "send_memory_usage", Value::Null);
    }

    fn set_target_height(&self, height: u32) {
        self.record("renderer", "set_target_height", json!(height));
    }
}
