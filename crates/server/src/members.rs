//! Membership endpoints

use api_types::member::{Member, Role};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::EntityTrait;

use crate::{ServerError, server::ServerState, user};
use engine::GroupRole;

pub(crate) fn to_api(
    member: &engine::group_members::Model,
    who: &engine::users::Model,
) -> Result<Member, ServerError> {
    let role = match GroupRole::try_from(member.role.as_str())? {
        GroupRole::Owner => Role::Owner,
        GroupRole::Member => Role::Member,
    };
    Ok(Member {
        user_id: member.user_id.clone(),
        name: who.name.clone(),
        role,
        joined_at: member.joined_at,
    })
}

pub async fn list(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Member>>, ServerError> {
    let roster = state.engine.list_members(&group_id, &account.id).await?;

    let mut members = Vec::with_capacity(roster.len());
    for member in roster {
        let who = engine::users::Entity::find_by_id(member.user_id.clone())
            .one(&state.db)
            .await
            .map_err(engine::EngineError::from)?
            .ok_or_else(|| {
                ServerError::Engine(engine::EngineError::KeyNotFound(
                    "user not exists".to_string(),
                ))
            })?;
        members.push(to_api(&member, &who)?);
    }

    Ok(Json(members))
}

/// Handle requests for removing a member (any member may remove any member)
pub async fn remove(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((group_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_member(&group_id, &user_id, &account.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.leave_group(&group_id, &account.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
