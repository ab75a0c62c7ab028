//! Kernel handlers routed end to end against recording collaborators.

use renderbridge_common::actions::ProfileDelta;
use renderbridge_common::types::{CatalogFilters, DEFAULT_PLAYER_HEIGHT};
use renderbridge_common::{Config, StoreAction, TelemetryEvent, UnknownMessagePolicy};
use renderbridge_engine::Outcome;
use renderbridge_kernel::handlers::dispatch_table;
use renderbridge_kernel::handlers::profile::GET_A_WALLET_URL;
use renderbridge_kernel::testing::TestKernel;
use renderbridge_kernel::{Capabilities, RecordingServices};
use serde_json::json;

#[test]
fn unverified_name_saves_unclaimed_profile_name() {
    let t = TestKernel::new();

    let outcome = t.send("SaveUserUnverifiedName", json!({ "newUnverifiedName": "Bob" }));

    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(
        t.actions(),
        vec![StoreAction::save_profile(ProfileDelta {
            name: Some("Bob".into()),
            has_claimed_name: Some(false),
            ..Default::default()
        })]
    );
}

#[test]
fn interests_are_deduplicated_in_order() {
    let t = TestKernel::new();

    t.send("SaveUserInterests", json!(["music", "art", "music", "games"]));
    t.send("SaveUserInterests", json!(null));

    assert_eq!(
        t.actions(),
        vec![StoreAction::save_profile(ProfileDelta {
            interests: Some(vec!["music".into(), "art".into(), "games".into()]),
            ..Default::default()
        })]
    );
}

#[test]
fn malformed_payload_fails_only_that_message() {
    let t = TestKernel::new();

    let outcome = t.send("SaveUserUnverifiedName", json!({}));
    assert_eq!(outcome, Outcome::Failed);

    let failures = t.events_of("handler_failed");
    assert_eq!(failures.len(), 1);
    match &failures[0] {
        TelemetryEvent::HandlerFailed {
            message_type,
            error,
            ..
        } => {
            assert_eq!(message_type, "SaveUserUnverifiedName");
            assert!(error.contains("SaveUserUnverifiedName"), "{error}");
        }
        other => panic!("unexpected event {other:?}"),
    }

    assert_eq!(t.send("LogOut", json!(null)), Outcome::Handled);
    assert_eq!(t.actions(), vec![StoreAction::Logout]);
}

#[test]
fn own_profile_update_needs_a_session() {
    let t = TestKernel::new();
    t.send("RequestOwnProfileUpdate", json!(null));
    assert!(t.actions().is_empty());

    t.login("0xabc", true);
    t.send("RequestOwnProfileUpdate", json!(null));
    assert_eq!(
        t.actions(),
        vec![StoreAction::SendProfileToRenderer {
            user_id: "0xabc".into()
        }]
    );
}

#[test]
fn motd_sends_walletless_players_to_wallet_guide() {
    let t = TestKernel::new();
    t.send("MotdConfirmClicked", json!(null));
    let opened = t.calls_to("open_url");
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].args, json!(GET_A_WALLET_URL));

    let t = TestKernel::new();
    t.login("0xabc", true);
    t.send("MotdConfirmClicked", json!(null));
    assert!(t.calls_to("open_url").is_empty());
}

#[tokio::test]
async fn channel_messages_follow_the_channels_flag() {
    let t = TestKernel::new();

    let outcome = t.send("JoinOrCreateChannel", json!({ "channelId": "general" }));
    assert_eq!(
        outcome,
        Outcome::Gated {
            gate: "channels".into()
        }
    );
    t.settle().await;
    assert!(t.calls().is_empty());

    t.kernel().capabilities().set_channels(true);

    let outcome = t.send("JoinOrCreateChannel", json!({ "channelId": "general" }));
    assert_eq!(outcome, Outcome::Handled);
    t.settle().await;
    let joined = t.calls_to("join_channel");
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].args, json!({ "channelId": "general" }));
}

#[tokio::test]
async fn failing_async_call_is_reported_and_routing_continues() {
    let services = RecordingServices::new();
    services.fail("get_friends");
    let t = TestKernel::with_services(services);

    assert_eq!(t.send("GetFriends", json!({ "limit": 10 })), Outcome::Handled);
    assert_eq!(t.send("BlockPlayer", json!({ "userId": "u1" })), Outcome::Handled);
    t.settle().await;

    assert_eq!(
        t.actions(),
        vec![StoreAction::BlockPlayers {
            user_ids: vec!["u1".into()]
        }]
    );
    let failures = t.events_of("handler_failed");
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        &failures[0],
        TelemetryEvent::HandlerFailed { message_type, .. } if message_type == "GetFriends"
    ));
}

#[tokio::test]
async fn failing_channel_join_names_the_channel() {
    let services = RecordingServices::new();
    services.fail("join_channel");
    let t = TestKernel::with_services(services);
    t.kernel().capabilities().set_channels(true);

    t.send("JoinOrCreateChannel", json!({ "channelId": "lobby" }));
    t.settle().await;

    match t.events_of("handler_failed").as_slice() {
        [TelemetryEvent::HandlerFailed { error, context, .. }] => {
            assert_eq!(context, "kernel:channels");
            assert!(error.contains("error joining channel lobby"), "{error}");
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[tokio::test]
async fn nearby_conversations_are_never_marked_seen() {
    let t = TestKernel::with_channels();

    t.send("MarkMessagesAsSeen", json!({ "userId": "nearby" }));
    t.send("MarkChannelMessagesAsSeen", json!({ "channelId": "nearby" }));
    t.settle().await;
    assert!(t.calls().is_empty());

    t.send("MarkMessagesAsSeen", json!({ "userId": "0xfriend" }));
    t.send("MarkChannelMessagesAsSeen", json!({ "channelId": "lobby" }));
    t.settle().await;
    assert_eq!(t.calls_to("mark_private_messages_seen")[0].args, json!("0xfriend"));
    assert_eq!(t.calls_to("mark_channel_messages_seen")[0].args, json!("lobby"));
}

#[tokio::test]
async fn joining_voice_chat_waits_for_user_interaction() {
    let t = TestKernel::new();

    assert_eq!(t.send("JoinVoiceChat", json!(null)), Outcome::Handled);
    tokio::task::yield_now().await;
    assert!(t.actions().is_empty());

    t.kernel().signal_user_interaction();
    t.settle().await;
    assert_eq!(t.actions(), vec![StoreAction::JoinVoiceChat]);
}

#[test]
fn deprecated_messages_still_run_and_are_reported() {
    let t = TestKernel::new();

    assert!(!t.kernel().has_started());
    assert_eq!(
        t.send("SystemInfoReport", json!({ "graphicsDeviceName": "gpu" })),
        Outcome::Handled
    );
    assert!(t.kernel().has_started());

    let deprecated = t.events_of("deprecated_message");
    assert_eq!(
        deprecated,
        vec![TelemetryEvent::DeprecatedMessage {
            message_type: "SystemInfoReport".into()
        }]
    );
    assert_eq!(t.events_of("tracked").len(), 1);
}

#[test]
fn unknown_messages_are_ignored_unless_escalated() {
    let t = TestKernel::new();
    assert_eq!(t.send("NotARealMessage", json!({})), Outcome::Unknown);
    assert!(t.events().is_empty());

    let mut config = Config::default();
    config.unknown_message_policy = UnknownMessagePolicy::Escalate;
    let t = TestKernel::with_config(config);
    assert_eq!(t.send("NotARealMessage", json!({})), Outcome::Unknown);
    assert_eq!(
        t.events(),
        vec![TelemetryEvent::UnknownMessage {
            message_type: "NotARealMessage".into()
        }]
    );
}

#[test]
fn zero_or_missing_player_height_falls_back_to_default() {
    let t = TestKernel::new();
    let position = json!({ "x": 1.0, "y": 0.0, "z": 2.0 });
    let rotation = json!({ "x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0 });

    t.send(
        "ReportPosition",
        json!({ "position": position, "rotation": rotation, "playerHeight": 0.0 }),
    );
    t.send(
        "ReportPosition",
        json!({ "position": position, "rotation": rotation }),
    );
    t.send(
        "ReportPosition",
        json!({ "position": position, "rotation": rotation, "playerHeight": 1.8 }),
    );

    let heights: Vec<_> = t
        .calls_to("receive_position_report")
        .into_iter()
        .map(|call| call.args["player_height"].clone())
        .collect();
    assert_eq!(
        heights,
        vec![
            json!(DEFAULT_PLAYER_HEIGHT),
            json!(DEFAULT_PLAYER_HEIGHT),
            json!(1.8)
        ]
    );
}

#[test]
fn load_radius_is_rounded_and_at_least_one() {
    let t = TestKernel::new();

    t.send("SetScenesLoadRadius", json!({ "newRadius": 0.2 }));
    t.send("SetScenesLoadRadius", json!({ "newRadius": 4.6 }));

    assert_eq!(
        t.actions(),
        vec![
            StoreAction::SetWorldLoadingRadius { radius: 1 },
            StoreAction::SetWorldLoadingRadius { radius: 5 },
        ]
    );
}

#[test]
fn home_scene_prefers_coordinates() {
    let t = TestKernel::new();

    t.send(
        "SetHomeScene",
        json!({ "sceneId": "bafk", "sceneCoords": "10,20" }),
    );
    t.send("SetHomeScene", json!({ "sceneId": "bafk", "sceneCoords": "" }));
    assert_eq!(t.send("SetHomeScene", json!({})), Outcome::Failed);

    assert_eq!(
        t.actions(),
        vec![
            StoreAction::SetHomeScene {
                position: "10,20".into()
            },
            StoreAction::SetHomeScene {
                position: "bafk".into()
            },
        ]
    );
}

#[test]
fn catalog_filters_drop_empty_ids() {
    let t = TestKernel::new();

    t.send(
        "RequestWearables",
        json!({
            "filters": {
                "ownedByUser": "0xabc",
                "wearableIds": [null, "", "urn:w1"],
                "collectionIds": []
            },
            "context": "backpack"
        }),
    );
    t.send(
        "RequestEmotes",
        json!({ "filters": { "emoteIds": ["urn:e1"] } }),
    );

    assert_eq!(
        t.actions(),
        vec![
            StoreAction::WearablesRequest {
                filters: CatalogFilters {
                    owned_by_user: Some("0xabc".into()),
                    item_ids: Some(vec!["urn:w1".into()]),
                    ..Default::default()
                },
                context: Some("backpack".into()),
            },
            StoreAction::EmotesRequest {
                filters: CatalogFilters {
                    item_ids: Some(vec!["urn:e1".into()]),
                    ..Default::default()
                },
                context: None,
            },
        ]
    );
}

#[test]
fn scene_report_resolves_scene_number() {
    let services = RecordingServices::new();
    services.load_scene(7, "bafk-seven");
    let t = TestKernel::with_services(services);

    assert_eq!(t.send("ReportScene", json!({ "sceneNumber": 7 })), Outcome::Handled);
    assert_eq!(t.send("ReportScene", json!({ "sceneNumber": 8 })), Outcome::Failed);

    let opened = t.calls_to("open_url");
    assert_eq!(opened.len(), 1);
    assert_eq!(
        opened[0].args,
        json!("https://dcl.gg/report-user-or-scene?scene_or_name=bafk-seven")
    );
}

#[test]
fn dispatch_table_routes_every_kernel_message() {
    let caps = Capabilities::new(false, true);
    let table = match dispatch_table(&caps) {
        Ok(table) => table,
        Err(err) => panic!("dispatch table failed to build: {err}"),
    };

    for name in [
        "LogOut",
        "SaveUserUnverifiedName",
        "GetFriends",
        "JoinOrCreateChannel",
        "ReportPosition",
        "GoToMagic",
        "GoToCrowd",
        "ReportMousePosition",
        "Web3UseResponse",
        "JoinVoiceChat",
        "RequestWearables",
        "ReportLog",
        "PreloadFinished",
    ] {
        assert!(table.contains(name), "missing route {name}");
    }

    assert_eq!(
        table.get("GetChannelInfo").and_then(|r| r.gate_name()),
        Some("channels")
    );
    assert_eq!(
        table.get("FetchHotScenes").and_then(|r| r.gate_name()),
        Some("world_explorer")
    );
    assert!(table.get("Track").is_some_and(|r| r.is_deprecated()));
    assert!(!table.get("GetFriends").is_some_and(|r| r.is_deprecated()));
}
