//! Renderer message handlers and the table that routes to them.
//!
//! One function per message type. Each decodes its payload and makes a
//! single collaborator call; asynchronous calls are detached through
//! `Kernel::tasks` so their failures are reported with the message type.

pub mod calls;
pub mod catalog;
pub mod channels;
pub mod host;
pub mod legacy;
pub mod profile;
pub mod social;
pub mod voice;
pub mod world;

use anyhow::Result;
use renderbridge_common::BridgeError;
use renderbridge_engine::{DispatchTable, Route};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::capabilities::Capabilities;
use crate::kernel::Kernel;

/// Decode a payload, tagging failures with the message type.
pub(crate) fn decode<T: DeserializeOwned>(message_type: &'static str, payload: Value) -> Result<T> {
    serde_json::from_value(payload).map_err(|source| {
        BridgeError::Payload {
            message_type: message_type.to_string(),
            source,
        }
        .into()
    })
}

/// Every message type the kernel understands.
pub fn dispatch_table(caps: &Capabilities) -> Result<DispatchTable<Kernel>, BridgeError> {
    let channels_gate = caps.channels_gate();
    let explorer_gate = caps.world_explorer_gate();
    let channel = |handler: fn(&Kernel, Value) -> Result<()>| {
        Route::new(handler).gated(channels_gate.clone())
    };
    let deprecated = |handler: fn(&Kernel, Value) -> Result<()>| Route::new(handler).deprecated();

    DispatchTable::builder()
        // Session and profile
        .route("LogOut", profile::log_out)
        .route("RedirectToSignUp", profile::redirect_to_sign_up)
        .route("SendPassport", profile::send_passport)
        .route("SaveUserInterests", profile::save_user_interests)
        .route("SaveUserAvatar", profile::save_user_avatar)
        .route("RequestOwnProfileUpdate", profile::request_own_profile_update)
        .route("SaveUserUnverifiedName", profile::save_user_unverified_name)
        .route("SaveUserDescription", profile::save_user_description)
        .route("SaveUserTutorialStep", profile::save_user_tutorial_step)
        .route("CloseUserAvatar", profile::close_user_avatar)
        .route("RequestUserProfile", profile::request_user_profile)
        .route("MotdConfirmClicked", profile::motd_confirm_clicked)
        // Social
        .route("GetFriends", social::get_friends)
        .add("GetFriendRequests", deprecated(social::get_friend_requests))
        .route("MarkMessagesAsSeen", social::mark_messages_as_seen)
        .route("GetPrivateMessages", social::get_private_messages)
        .route("GetUnseenMessagesByUser", social::get_unseen_messages_by_user)
        .route("GetFriendsWithDirectMessages", social::get_friends_with_direct_messages)
        .add("UpdateFriendshipStatus", deprecated(social::update_friendship_status))
        .route("BlockPlayer", social::block_player)
        .route("UnblockPlayer", social::unblock_player)
        .route("SetMuteUsers", social::set_mute_users)
        .route("ReportPlayer", social::report_player)
        .route("SendChatMessage", social::send_chat_message)
        // Channels
        .add("CreateChannel", channel(channels::create_channel))
        .add("JoinOrCreateChannel", channel(channels::join_or_create_channel))
        .add("MarkChannelMessagesAsSeen", channel(channels::mark_channel_messages_as_seen))
        .add("GetChannelMessages", channel(channels::get_channel_messages))
        .add("GetChannels", channel(channels::get_channels))
        .add("GetChannelMembers", channel(channels::get_channel_members))
        .add("GetUnseenMessagesByChannel", channel(channels::get_unseen_messages_by_channel))
        .add("GetJoinedChannels", channel(channels::get_joined_channels))
        .add("LeaveChannel", channel(channels::leave_channel))
        .add("MuteChannel", channel(channels::mute_channel))
        .add("GetChannelInfo", channel(channels::get_channel_info))
        // World, scenes and teleport
        .route("ReportPosition", world::report_position)
        .route("AllScenesEvent", world::all_scenes_event)
        .route("SceneEvent", world::scene_event)
        .route("GoTo", world::go_to)
        .route("GoToMagic", world::go_to_crowd)
        .route("GoToCrowd", world::go_to_crowd)
        .route("JumpIn", world::jump_in)
        .route("LoadingHUDReadyForTeleport", world::loading_hud_ready_for_teleport)
        .route("SetScenesLoadRadius", world::set_scenes_load_radius)
        .route("SetHomeScene", world::set_home_scene)
        .route("RequestScenesInfoInArea", world::request_scenes_info_in_area)
        .route("ReportScene", world::report_scene)
        .route("ControlEvent", world::control_event)
        .route("VideoProgressEvent", world::video_progress_event)
        .route("ReportAvatarState", world::report_avatar_state)
        .route("ReportDecentralandTime", world::report_world_time)
        .add(
            "FetchHotScenes",
            Route::new(world::fetch_hot_scenes).gated(explorer_gate),
        )
        .route("TermsOfServiceResponse", world::terms_of_service_response)
        .route("KillPortableExperience", world::kill_portable_experience)
        .route("SetDisabledPortableExperiences", world::set_disabled_portable_experiences)
        // Pending-call replies
        .route("ReportMousePosition", calls::report_mouse_position)
        .route("SendScreenshot", calls::send_screenshot)
        .route("ReportBuilderCameraTarget", calls::report_builder_camera_target)
        .route("Web3UseResponse", calls::web3_use_response)
        // Voice and audio
        .route("SetVoiceChatRecording", voice::set_voice_chat_recording)
        .route("JoinVoiceChat", voice::join_voice_chat)
        .route("LeaveVoiceChat", voice::leave_voice_chat)
        .route("ToggleVoiceChatRecording", voice::toggle_voice_chat_recording)
        .route("ApplySettings", voice::apply_settings)
        .route("SetInputAudioDevice", voice::set_input_audio_device)
        .route("RequestAudioDevices", voice::request_audio_devices)
        .route("SetAudioStream", voice::set_audio_stream)
        // Catalog
        .route("RequestWearables", catalog::request_wearables)
        .route("RequestEmotes", catalog::request_emotes)
        // Renderer and host
        .add("SystemInfoReport", deprecated(host::system_info_report))
        .route("CrashPayloadResponse", host::crash_payload_response)
        .route("OpenWebURL", host::open_web_url)
        .route("SetBaseResolution", host::set_base_resolution)
        .route("UpdateMemoryUsage", host::update_memory_usage)
        .route("RequestGIFProcessor", host::request_gif_processor)
        .route("DeleteGIF", host::delete_gif)
        .add("RequestSignedHeader", deprecated(host::request_signed_header))
        .route("SearchENSOwner", host::search_ens_owner)
        .route("FetchBalanceOfMANA", host::fetch_balance_of_mana)
        .route("NotifyStatusThroughChat", host::notify_status_through_chat)
        .route("ReportAvatarFatalError", host::report_avatar_fatal_error)
        .route("ReportLog", host::report_log)
        .add("SetDelightedSurveyEnabled", deprecated(host::set_delighted_survey_enabled))
        .route("StartIsolatedMode", host::start_isolated_mode)
        .route("StopIsolatedMode", host::stop_isolated_mode)
        // Legacy
        .add("PerformanceReport", deprecated(legacy::performance_report))
        .add("Track", deprecated(legacy::track))
        .add("TriggerExpression", deprecated(legacy::trigger_expression))
        .add("ScenesLoadingFeedback", deprecated(legacy::scenes_loading_feedback))
        .add("UserAcceptedCollectibles", deprecated(legacy::ignored))
        .add("UnpublishScene", deprecated(legacy::ignored))
        .route("PreloadFinished", legacy::ignored)
        .route("RequestBIWCatalogHeader", legacy::builder_request)
        .route("RequestHeaderForUrl", legacy::builder_request)
        .route("RequestSignedHeaderForBuilder", legacy::builder_request)
        .route("PublishSceneState", legacy::publish_scene_state)
        .build()
}
