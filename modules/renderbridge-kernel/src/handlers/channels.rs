//! Chat channel messages. Every route here sits behind the `channels` gate.

use anyhow::{Context, Result};
use renderbridge_common::types::ChannelRef;
use renderbridge_common::StoreAction;
use serde_json::Value;

use super::decode;
use super::social::NEARBY;
use crate::kernel::Kernel;

const CONTEXT: &str = "kernel:channels";

/// Channel id for error context, or empty if the payload has none.
fn channel_id(payload: &Value) -> String {
    payload
        .get("channelId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn create_channel(k: &Kernel, payload: Value) -> Result<()> {
    let id = channel_id(&payload);
    let channels = k.deps.channels.clone();
    k.tasks.spawn("CreateChannel", CONTEXT, async move {
        channels
            .create_channel(payload)
            .await
            .with_context(|| format!("error creating channel {id}"))
    });
    Ok(())
}

pub fn join_or_create_channel(k: &Kernel, payload: Value) -> Result<()> {
    let id = channel_id(&payload);
    let channels = k.deps.channels.clone();
    k.tasks.spawn("JoinOrCreateChannel", CONTEXT, async move {
        channels
            .join_channel(payload)
            .await
            .with_context(|| format!("error joining channel {id}"))
    });
    Ok(())
}

pub fn mark_channel_messages_as_seen(k: &Kernel, payload: Value) -> Result<()> {
    let channel: ChannelRef = decode("MarkChannelMessagesAsSeen", payload)?;
    if channel.channel_id == NEARBY {
        return Ok(());
    }

    let channels = k.deps.channels.clone();
    k.tasks.spawn("MarkChannelMessagesAsSeen", CONTEXT, async move {
        let context = format!("error marking channel messages as seen {}", channel.channel_id);
        channels
            .mark_channel_messages_seen(channel.channel_id)
            .await
            .context(context)
    });
    Ok(())
}

pub fn get_channel_messages(k: &Kernel, payload: Value) -> Result<()> {
    let id = channel_id(&payload);
    let channels = k.deps.channels.clone();
    k.tasks.spawn("GetChannelMessages", CONTEXT, async move {
        channels
            .get_channel_messages(payload)
            .await
            .with_context(|| format!("error getting channel messages {id}"))
    });
    Ok(())
}

pub fn get_channels(k: &Kernel, payload: Value) -> Result<()> {
    let channels = k.deps.channels.clone();
    k.tasks.spawn("GetChannels", CONTEXT, async move {
        channels
            .search_channels(payload)
            .await
            .context("error searching channels")
    });
    Ok(())
}

pub fn get_channel_members(k: &Kernel, payload: Value) -> Result<()> {
    let channels = k.deps.channels.clone();
    k.tasks.spawn("GetChannelMembers", CONTEXT, async move {
        channels
            .get_channel_members(payload)
            .await
            .context("error getting channel members")
    });
    Ok(())
}

pub fn get_unseen_messages_by_channel(k: &Kernel, _payload: Value) -> Result<()> {
    let channels = k.deps.channels.clone();
    k.tasks.spawn("GetUnseenMessagesByChannel", CONTEXT, async move {
        channels.get_unseen_messages_by_channel().await
    });
    Ok(())
}

pub fn get_joined_channels(k: &Kernel, payload: Value) -> Result<()> {
    let channels = k.deps.channels.clone();
    k.tasks.spawn("GetJoinedChannels", CONTEXT, async move {
        channels.get_joined_channels(payload).await
    });
    Ok(())
}

pub fn leave_channel(k: &Kernel, payload: Value) -> Result<()> {
    let channel: ChannelRef = decode("LeaveChannel", payload)?;
    k.deps.store.dispatch(StoreAction::LeaveChannel {
        channel_id: channel.channel_id,
    });
    Ok(())
}

pub fn mute_channel(k: &Kernel, payload: Value) -> Result<()> {
    let channels = k.deps.channels.clone();
    k.tasks.spawn("MuteChannel", CONTEXT, async move {
        channels.mute_channel(payload).await
    });
    Ok(())
}

pub fn get_channel_info(k: &Kernel, payload: Value) -> Result<()> {
    let channels = k.deps.channels.clone();
    k.tasks.spawn("GetChannelInfo", CONTEXT, async move {
        channels.get_channel_info(payload).await
    });
    Ok(())
}
