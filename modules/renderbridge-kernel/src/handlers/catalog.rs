//! Wearable and emote catalog requests.

use anyhow::Result;
use renderbridge_common::types::{CatalogFilters, CatalogRequestPayload};
use renderbridge_common::StoreAction;
use serde_json::Value;

use super::decode;
use crate::kernel::Kernel;

pub fn request_wearables(k: &Kernel, payload: Value) -> Result<()> {
    let data: CatalogRequestPayload = decode("RequestWearables", payload)?;
    k.deps.store.dispatch(StoreAction::WearablesRequest {
        filters: CatalogFilters::from(data.filters),
        context: data.context,
    });
    Ok(())
}

pub fn request_emotes(k: &Kernel, payload: Value) -> Result<()> {
    let data: CatalogRequestPayload = decode("RequestEmotes", payload)?;
    k.deps.store.dispatch(StoreAction::EmotesRequest {
        filters: CatalogFilters::from(data.filters),
        context: data.context,
    });
    Ok(())
}
