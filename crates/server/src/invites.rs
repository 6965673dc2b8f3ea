//! Invite endpoints

use api_types::invite::{Invite, InviteInfo, InviteNew};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{ServerError, server::ServerState, user};

fn to_api(invite: engine::group_invites::Model) -> Invite {
    Invite {
        token: invite.token,
        group_id: invite.group_id,
        expires_at: invite.expires_at,
        max_uses: invite.max_uses,
        uses_count: invite.uses_count,
        is_active: invite.is_active,
    }
}

/// Handle requests for minting a fresh invite token (any member)
pub async fn invite_new(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<InviteNew>,
) -> Result<Json<Invite>, ServerError> {
    let invite = state
        .engine
        .create_invite(
            &group_id,
            &account.id,
            payload.expires_at,
            payload.max_uses,
            Utc::now(),
        )
        .await?;

    Ok(Json(to_api(invite)))
}

/// Pre-login preview of an invite token. The only unauthenticated route.
pub async fn info(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<InviteInfo>, ServerError> {
    let (invite, group_name) = state.engine.invite_info(&token).await?;

    Ok(Json(InviteInfo {
        group_name,
        expires_at: invite.expires_at,
        is_active: invite.is_active,
    }))
}

/// Handle requests for joining a group through an invite token
pub async fn redeem(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .redeem_invite(&token, &account.id, Utc::now())
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn revoke(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<Invite>, ServerError> {
    let invite = state.engine.revoke_invite(&token, &account.id).await?;
    Ok(Json(to_api(invite)))
}
