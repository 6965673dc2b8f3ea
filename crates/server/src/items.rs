//! Gift item endpoints

use api_types::item::{FundingStatus, Item, ItemNew, ItemType};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{ServerError, currency_from_api, currency_to_api, server::ServerState, user};

const DEFAULT_PAGE_SIZE: u64 = 50;

fn item_type_from_api(item_type: ItemType) -> engine::ItemType {
    match item_type {
        ItemType::Normal => engine::ItemType::Normal,
        ItemType::Pooled => engine::ItemType::Pooled,
    }
}

fn item_type_to_api(item_type: engine::ItemType) -> ItemType {
    match item_type {
        engine::ItemType::Normal => ItemType::Normal,
        engine::ItemType::Pooled => ItemType::Pooled,
    }
}

fn to_api(item: engine::GiftItem) -> Item {
    Item {
        id: item.id.to_string(),
        title: item.title,
        item_type: item_type_to_api(item.item_type),
        target_amount_minor: item.target_amount_minor,
        current_amount_minor: item.current_amount_minor,
        currency: currency_to_api(item.currency),
    }
}

/// Handle requests for registering a new gift item
pub async fn item_new(
    _: Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ItemNew>,
) -> Result<Json<Item>, ServerError> {
    let item = state
        .engine
        .new_item(
            &payload.title,
            item_type_from_api(payload.item_type),
            payload.target_amount_minor,
            currency_from_api(payload.currency),
        )
        .await?;

    Ok(Json(to_api(item)))
}

pub async fn get(
    _: Extension<user::Model>,
    State(state): State<ServerState>,
    Path(item_id): Path<String>,
) -> Result<Json<Item>, ServerError> {
    let item = state.engine.item(&item_id).await?;
    Ok(Json(to_api(item)))
}

#[derive(Deserialize)]
pub struct FundingPage {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Handle requests for a pooled item's funding snapshot
pub async fn funding(
    _: Extension<user::Model>,
    State(state): State<ServerState>,
    Path(item_id): Path<String>,
    Query(page): Query<FundingPage>,
) -> Result<Json<FundingStatus>, ServerError> {
    let status = state
        .engine
        .funding_status(
            &item_id,
            page.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            page.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(FundingStatus {
        current_amount_minor: status.current_amount_minor,
        target_amount_minor: status.target_amount_minor,
        currency: currency_to_api(status.currency),
        contributions: status
            .contributions
            .into_iter()
            .map(crate::contributions::to_api)
            .collect(),
    }))
}
