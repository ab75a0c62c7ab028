//! Session and profile messages.

use std::collections::HashSet;

use anyhow::Result;
use renderbridge_common::actions::ProfileDelta;
use renderbridge_common::types::{
    DescriptionPayload, PassportPayload, TutorialStepPayload, UnverifiedNamePayload, ValuePayload,
};
use renderbridge_common::StoreAction;
use serde_json::Value;

use super::decode;
use crate::kernel::Kernel;

/// Where players without a wallet are sent after the message of the day.
pub const GET_A_WALLET_URL: &str = "https://docs.decentraland.org/get-a-wallet/";

pub fn log_out(k: &Kernel, _payload: Value) -> Result<()> {
    k.deps.store.dispatch(StoreAction::Logout);
    Ok(())
}

pub fn redirect_to_sign_up(k: &Kernel, _payload: Value) -> Result<()> {
    k.deps.store.dispatch(StoreAction::RedirectToSignUp);
    Ok(())
}

pub fn send_passport(k: &Kernel, payload: Value) -> Result<()> {
    let passport: PassportPayload = decode("SendPassport", payload)?;
    k.deps.store.dispatch(StoreAction::SignUp {
        email: passport.email,
        name: passport.name,
    });
    Ok(())
}

/// Interests arrive as a bare array; duplicates are dropped keeping first
/// occurrence order. A null payload is ignored.
pub fn save_user_interests(k: &Kernel, payload: Value) -> Result<()> {
    let Some(interests): Option<Vec<String>> = decode("SaveUserInterests", payload)? else {
        return Ok(());
    };

    let mut seen = HashSet::new();
    let unique: Vec<String> = interests
        .into_iter()
        .filter(|interest| seen.insert(interest.clone()))
        .collect();

    k.deps.store.dispatch(StoreAction::save_profile(ProfileDelta {
        interests: Some(unique),
        ..Default::default()
    }));
    Ok(())
}

pub fn save_user_avatar(k: &Kernel, payload: Value) -> Result<()> {
    let host = k.deps.host.clone();
    k.tasks.spawn("SaveUserAvatar", "kernel:profile", async move {
        host.save_user_avatar(payload).await
    });
    Ok(())
}

pub fn request_own_profile_update(k: &Kernel, _payload: Value) -> Result<()> {
    if let Some(user_id) = k.deps.store.session().user_id {
        k.deps
            .store
            .dispatch(StoreAction::SendProfileToRenderer { user_id });
    }
    Ok(())
}

pub fn save_user_unverified_name(k: &Kernel, payload: Value) -> Result<()> {
    let changes: UnverifiedNamePayload = decode("SaveUserUnverifiedName", payload)?;
    k.deps.store.dispatch(StoreAction::save_profile(ProfileDelta {
        name: Some(changes.new_unverified_name),
        has_claimed_name: Some(false),
        ..Default::default()
    }));
    Ok(())
}

pub fn save_user_description(k: &Kernel, payload: Value) -> Result<()> {
    let changes: DescriptionPayload = decode("SaveUserDescription", payload)?;
    k.deps.store.dispatch(StoreAction::save_profile(ProfileDelta {
        description: Some(changes.description),
        ..Default::default()
    }));
    Ok(())
}

pub fn save_user_tutorial_step(k: &Kernel, payload: Value) -> Result<()> {
    let data: TutorialStepPayload = decode("SaveUserTutorialStep", payload)?;
    k.deps.store.dispatch(StoreAction::save_profile(ProfileDelta {
        tutorial_step: Some(data.tutorial_step),
        ..Default::default()
    }));
    Ok(())
}

/// Payload is a bare boolean: whether the editor was closed during sign-up.
pub fn close_user_avatar(k: &Kernel, payload: Value) -> Result<()> {
    if payload.as_bool() == Some(true) {
        k.deps.store.dispatch(StoreAction::SignUpCancel);
    }
    Ok(())
}

pub fn request_user_profile(k: &Kernel, payload: Value) -> Result<()> {
    let user: ValuePayload = decode("RequestUserProfile", payload)?;
    let host = k.deps.host.clone();
    k.tasks.spawn("RequestUserProfile", "kernel:profile", async move {
        host.retrieve_profile(user.value).await
    });
    Ok(())
}

pub fn motd_confirm_clicked(k: &Kernel, _payload: Value) -> Result<()> {
    if !k.deps.store.session().has_wallet {
        k.deps.host.open_url(GET_A_WALLET_URL.to_string());
    }
    Ok(())
}
