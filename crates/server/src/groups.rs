//! Group endpoints

use api_types::group::{GroupCreated, GroupDetail, GroupNew, GroupRename, GroupSummary};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{ServerError, members, server::ServerState, user};

/// Handle requests for creating a new group.
///
/// The response carries the group's first invite token so the creator can
/// share it straight away.
pub async fn group_new(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<Json<GroupCreated>, ServerError> {
    let (group, invite) = state
        .engine
        .create_group(&payload.name, &account.id, Utc::now())
        .await?;

    Ok(Json(GroupCreated {
        id: group.id,
        name: group.name,
        invite_token: invite.token,
        invite_expires_at: invite.expires_at,
    }))
}

pub async fn list(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GroupSummary>>, ServerError> {
    let groups = state.engine.groups_for_user(&account.id).await?;

    Ok(Json(
        groups
            .into_iter()
            .map(|g| GroupSummary {
                id: g.id,
                name: g.name,
                member_count: g.member_count,
                created_at: g.created_at,
            })
            .collect(),
    ))
}

pub async fn detail(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupDetail>, ServerError> {
    let (group, roster) = state.engine.group_detail(&group_id, &account.id).await?;

    let members = roster
        .into_iter()
        .map(|(member, who)| members::to_api(&member, &who))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(GroupDetail {
        id: group.id,
        name: group.name,
        created_at: group.created_at,
        members,
    }))
}

/// Handle requests for renaming a group (any member)
pub async fn rename(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<GroupRename>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .rename_group(&group_id, &payload.name, &account.id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle requests for deleting a group (owner only)
pub async fn delete(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(&group_id, &account.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
