//! Contribution endpoints

use api_types::contribution::{Contribution, ContributionNew};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;

use crate::{ServerError, currency_from_api, currency_to_api, server::ServerState, user};

pub(crate) fn to_api(contribution: engine::Contribution) -> Contribution {
    Contribution {
        id: contribution.id.to_string(),
        item_id: contribution.item_id.to_string(),
        contributor_name: contribution.contributor_name,
        amount_minor: contribution.amount_minor,
        currency: currency_to_api(contribution.currency),
        message: contribution.message,
        created_at: contribution.created_at,
    }
}

/// Handle requests for recording a contribution against a pooled item
pub async fn contribution_new(
    _: Extension<user::Model>,
    State(state): State<ServerState>,
    Path(item_id): Path<String>,
    Json(payload): Json<ContributionNew>,
) -> Result<Json<Contribution>, ServerError> {
    let contribution = state
        .engine
        .record_contribution(
            &item_id,
            &payload.contributor_name,
            payload.amount_minor,
            currency_from_api(payload.currency),
            payload.message.as_deref(),
            Utc::now(),
        )
        .await?;

    Ok(Json(to_api(contribution)))
}
