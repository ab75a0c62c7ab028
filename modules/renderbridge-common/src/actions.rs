//! Actions the bridge dispatches into the application state store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{CatalogFilters, Parcel};

/// Partial profile update. Only the fields that are set are applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_claimed_name: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutorial_step: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreAction {
    // Session
    Logout,
    RedirectToSignUp,
    SignUp {
        email: String,
        name: String,
    },
    SignUpCancel,

    // Profile
    SaveProfileDelta {
        delta: ProfileDelta,
    },
    SendProfileToRenderer {
        user_id: String,
    },

    // Social
    BlockPlayers {
        user_ids: Vec<String>,
    },
    UnblockPlayers {
        user_ids: Vec<String>,
    },
    MutePlayers {
        user_ids: Vec<String>,
    },
    UnmutePlayers {
        user_ids: Vec<String>,
    },
    SendMessage {
        message: Value,
    },
    LeaveChannel {
        channel_id: String,
    },

    // World
    RendererSignalSceneReady {
        scene_id: Option<String>,
        scene_number: Option<i64>,
    },
    SetWorldLoadingRadius {
        radius: u32,
    },
    SetHomeScene {
        position: String,
    },
    ReportScenesAroundParcel {
        parcel: Parcel,
        scenes_around: u32,
    },
    RemoveScenePortableExperience {
        portable_experience_id: String,
    },
    DenyPortableExperiences {
        ids: Vec<String>,
    },

    // Voice
    SetAudioDevice {
        input_device_id: String,
    },
    RequestVoiceChatRecording {
        recording: bool,
    },
    RequestToggleVoiceChatRecording,
    JoinVoiceChat,
    LeaveVoiceChat,
    ApplyVoiceChatSettings {
        volume: f64,
        allow_category: i64,
    },

    // Catalog
    WearablesRequest {
        filters: CatalogFilters,
        context: Option<String>,
    },
    EmotesRequest {
        filters: CatalogFilters,
        context: Option<String>,
    },
}

impl StoreAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            StoreAction::Logout => "logout",
            StoreAction::RedirectToSignUp => "redirect_to_sign_up",
            StoreAction::SignUp { .. } => "sign_up",
            StoreAction::SignUpCancel => "sign_up_cancel",
            StoreAction::SaveProfileDelta { .. } => "save_profile_delta",
            StoreAction::SendProfileToRenderer { .. } => "send_profile_to_renderer",
            StoreAction::BlockPlayers { .. } => "block_players",
            StoreAction::UnblockPlayers { .. } => "unblock_players",
            StoreAction::MutePlayers { .. } => "mute_players",
            StoreAction::UnmutePlayers { .. } => "unmute_players",
            StoreAction::SendMessage { .. } => "send_message",
            StoreAction::LeaveChannel { .. } => "leave_channel",
            StoreAction::RendererSignalSceneReady { .. } => "renderer_signal_scene_ready",
            StoreAction::SetWorldLoadingRadius { .. } => "set_world_loading_radius",
            StoreAction::SetHomeScene { .. } => "set_home_scene",
            StoreAction::ReportScenesAroundParcel { .. } => "report_scenes_around_parcel",
            StoreAction::RemoveScenePortableExperience { .. } => {
                "remove_scene_portable_experience"
            }
            StoreAction::DenyPortableExperiences { .. } => "deny_portable_experiences",
            StoreAction::SetAudioDevice { .. } => "set_audio_device",
            StoreAction::RequestVoiceChatRecording { .. } => "request_voice_chat_recording",
            StoreAction::RequestToggleVoiceChatRecording => {
                "request_toggle_voice_chat_recording"
            }
            StoreAction::JoinVoiceChat => "join_voice_chat",
            StoreAction::LeaveVoiceChat => "leave_voice_chat",
            StoreAction::ApplyVoiceChatSettings { .. } => "apply_voice_chat_settings",
            StoreAction::WearablesRequest { .. } => "wearables_request",
            StoreAction::EmotesRequest { .. } => "emotes_request",
        }
    }

    pub fn save_profile(delta: ProfileDelta) -> Self {
        StoreAction::SaveProfileDelta { delta }
    }
}
