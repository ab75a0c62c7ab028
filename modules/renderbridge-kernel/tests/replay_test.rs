//! Recorded sessions replayed end to end.

use std::time::Duration;

use renderbridge_common::{Config, StoreAction};
use renderbridge_kernel::replay::{replay, ReplayOptions};

const SESSION: &str = r#"{"type":"LogOut","payload":null}
{"type":"JoinVoiceChat","payload":null}
"#;

#[tokio::test]
async fn voice_chat_join_completes_and_report_is_produced() {
    let report = replay(SESSION.as_bytes(), &Config::default(), &ReplayOptions::default())
        .await
        .unwrap();

    assert_eq!(report.outcomes.get("handled"), Some(&2));
    assert_eq!(
        report.actions,
        vec![StoreAction::Logout, StoreAction::JoinVoiceChat]
    );
    assert!(report.unfinished.is_empty());
    assert!(report.finished_at >= report.started_at);
}

#[tokio::test]
async fn stuck_work_is_named_instead_of_blocking_the_report() {
    let options = ReplayOptions {
        user_interaction: false,
        settle_timeout: Duration::from_millis(50),
    };

    let report = replay(SESSION.as_bytes(), &Config::default(), &options)
        .await
        .unwrap();

    assert_eq!(report.actions, vec![StoreAction::Logout]);
    assert_eq!(report.unfinished, vec!["JoinVoiceChat (kernel:voice)".to_string()]);
}

#[tokio::test]
async fn malformed_lines_are_counted_and_skipped() {
    let input = "not json\n\n{\"type\":\"LeaveVoiceChat\",\"payload\":null}\n";

    let report = replay(input.as_bytes(), &Config::default(), &ReplayOptions::default())
        .await
        .unwrap();

    assert_eq!(report.outcomes.get("malformed"), Some(&1));
    assert_eq!(report.outcomes.get("handled"), Some(&1));
    assert_eq!(report.actions, vec![StoreAction::LeaveVoiceChat]);
}
