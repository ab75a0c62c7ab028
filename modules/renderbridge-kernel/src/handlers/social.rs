//! Friends, private messages and player moderation.

use anyhow::{Context, Result};
use renderbridge_common::types::{MuteUsersPayload, UserRef};
use renderbridge_common::StoreAction;
use serde::Deserialize;
use serde_json::Value;

use super::decode;
use crate::kernel::Kernel;

/// The public nearby chat is not a conversation with a user.
pub const NEARBY: &str = "nearby";

pub const REPORT_URL: &str = "https://dcl.gg/report-user-or-scene?scene_or_name=";

pub fn get_friends(k: &Kernel, payload: Value) -> Result<()> {
    let friends = k.deps.friends.clone();
    k.tasks.spawn("GetFriends", "kernel:social", async move {
        friends.get_friends(payload).await
    });
    Ok(())
}

pub fn get_friend_requests(k: &Kernel, payload: Value) -> Result<()> {
    let friends = k.deps.friends.clone();
    k.tasks.spawn("GetFriendRequests", "kernel:social", async move {
        friends
            .get_friend_requests(payload)
            .await
            .context("error getting friend requests")
    });
    Ok(())
}

pub fn mark_messages_as_seen(k: &Kernel, payload: Value) -> Result<()> {
    let user: UserRef = decode("MarkMessagesAsSeen", payload)?;
    if user.user_id == NEARBY {
        return Ok(());
    }

    let friends = k.deps.friends.clone();
    k.tasks.spawn("MarkMessagesAsSeen", "kernel:social", async move {
        let context = format!("error marking private messages as seen {}", user.user_id);
        friends
            .mark_private_messages_seen(user.user_id)
            .await
            .context(context)
    });
    Ok(())
}

pub fn get_private_messages(k: &Kernel, payload: Value) -> Result<()> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Peek {
        #[serde(default)]
        user_id: Option<String>,
    }
    let user_id = Peek::deserialize(&payload)
        .ok()
        .and_then(|p| p.user_id)
        .unwrap_or_default();

    let friends = k.deps.friends.clone();
    k.tasks.spawn("GetPrivateMessages", "kernel:social", async move {
        friends
            .get_private_messages(payload)
            .await
            .with_context(|| format!("error getting private messages {user_id}"))
    });
    Ok(())
}

pub fn get_unseen_messages_by_user(k: &Kernel, _payload: Value) -> Result<()> {
    let friends = k.deps.friends.clone();
    k.tasks.spawn("GetUnseenMessagesByUser", "kernel:social", async move {
        friends.get_unseen_messages_by_user().await
    });
    Ok(())
}

pub fn get_friends_with_direct_messages(k: &Kernel, payload: Value) -> Result<()> {
    let friends = k.deps.friends.clone();
    k.tasks.spawn("GetFriendsWithDirectMessages", "kernel:social", async move {
        friends.get_friends_with_direct_messages(payload).await
    });
    Ok(())
}

pub fn update_friendship_status(k: &Kernel, payload: Value) -> Result<()> {
    let friends = k.deps.friends.clone();
    k.tasks.spawn("UpdateFriendshipStatus", "kernel:social", async move {
        friends.update_friendship_status(payload).await
    });
    Ok(())
}

pub fn block_player(k: &Kernel, payload: Value) -> Result<()> {
    let user: UserRef = decode("BlockPlayer", payload)?;
    k.deps.store.dispatch(StoreAction::BlockPlayers {
        user_ids: vec![user.user_id],
    });
    Ok(())
}

pub fn unblock_player(k: &Kernel, payload: Value) -> Result<()> {
    let user: UserRef = decode("UnblockPlayer", payload)?;
    k.deps.store.dispatch(StoreAction::UnblockPlayers {
        user_ids: vec![user.user_id],
    });
    Ok(())
}

pub fn set_mute_users(k: &Kernel, payload: Value) -> Result<()> {
    let data: MuteUsersPayload = decode("SetMuteUsers", payload)?;
    let action = if data.mute {
        StoreAction::MutePlayers {
            user_ids: data.users_id,
        }
    } else {
        StoreAction::UnmutePlayers {
            user_ids: data.users_id,
        }
    };
    k.deps.store.dispatch(action);
    Ok(())
}

pub fn report_player(k: &Kernel, payload: Value) -> Result<()> {
    let user: UserRef = decode("ReportPlayer", payload)?;
    k.deps.host.open_url(format!("{REPORT_URL}{}", user.user_id));
    Ok(())
}

pub fn send_chat_message(k: &Kernel, payload: Value) -> Result<()> {
    #[derive(Deserialize)]
    struct Data {
        message: Value,
    }
    let data: Data = decode("SendChatMessage", payload)?;
    k.deps.store.dispatch(StoreAction::SendMessage {
        message: data.message,
    });
    Ok(())
}
