use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    GroupRole, ResultEngine, group_invites, group_members, groups, users,
};

use super::{Engine, normalize_required_name, with_tx};

/// Default lifetime of the invite minted alongside a new group.
const DEFAULT_INVITE_DAYS: i64 = 60;

#[derive(Clone, Debug, PartialEq)]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub member_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Engine {
    /// Creates a group, its creator's OWNER membership and a default invite
    /// in one transaction.
    pub async fn create_group(
        &self,
        name: &str,
        creator_user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<(groups::Model, group_invites::Model)> {
        let name = normalize_required_name(name, "group")?;

        with_tx!(self, |db_tx| {
            async {
                self.require_user_exists(&db_tx, creator_user_id).await?;

                let group = groups::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    name: ActiveValue::Set(name.clone()),
                    created_by_user_id: ActiveValue::Set(creator_user_id.to_string()),
                    created_at: ActiveValue::Set(now),
                    updated_at: ActiveValue::Set(now),
                }
                .insert(&db_tx)
                .await?;

                group_members::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    group_id: ActiveValue::Set(group.id.clone()),
                    user_id: ActiveValue::Set(creator_user_id.to_string()),
                    role: ActiveValue::Set(GroupRole::Owner.as_str().to_string()),
                    joined_at: ActiveValue::Set(now),
                }
                .insert(&db_tx)
                .await?;

                let invite = self
                    .insert_invite(
                        &db_tx,
                        &group.id,
                        creator_user_id,
                        Some(now + Duration::days(DEFAULT_INVITE_DAYS)),
                        None,
                        now,
                    )
                    .await?;

                Ok((group, invite))
            }
            .await
        })
    }

    /// Renames a group. Any member may rename.
    pub async fn rename_group(
        &self,
        group_id: &str,
        name: &str,
        actor_user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<groups::Model> {
        let name = normalize_required_name(name, "group")?;

        with_tx!(self, |db_tx| {
            async {
                let (group, _member) = self
                    .require_group_member(&db_tx, group_id, actor_user_id)
                    .await?;

                let updated = groups::ActiveModel {
                    id: ActiveValue::Set(group.id),
                    name: ActiveValue::Set(name.clone()),
                    updated_at: ActiveValue::Set(now),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;

                Ok(updated)
            }
            .await
        })
    }

    /// Lists the groups the user belongs to, newest first.
    pub async fn groups_for_user(&self, user_id: &str) -> ResultEngine<Vec<GroupSummary>> {
        let rows: Vec<(group_members::Model, Option<groups::Model>)> =
            group_members::Entity::find()
                .filter(group_members::Column::UserId.eq(user_id.to_string()))
                .find_also_related(groups::Entity)
                .all(&self.database)
                .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (_, group) in rows {
            let Some(group) = group else { continue };
            let member_count = group_members::Entity::find()
                .filter(group_members::Column::GroupId.eq(group.id.clone()))
                .count(&self.database)
                .await?;
            out.push(GroupSummary {
                id: group.id,
                name: group.name,
                member_count,
                created_at: group.created_at,
            });
        }
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    /// Returns a group and its membership roster (member-only read).
    pub async fn group_detail(
        &self,
        group_id: &str,
        actor_user_id: &str,
    ) -> ResultEngine<(groups::Model, Vec<(group_members::Model, users::Model)>)> {
        with_tx!(self, |db_tx| {
            async {
                let (group, _member) = self
                    .require_group_member(&db_tx, group_id, actor_user_id)
                    .await?;

                let rows: Vec<(group_members::Model, Option<users::Model>)> =
                    group_members::Entity::find()
                        .filter(group_members::Column::GroupId.eq(group_id.to_string()))
                        .find_also_related(users::Entity)
                        .order_by_asc(group_members::Column::JoinedAt)
                        .all(&db_tx)
                        .await?;

                let mut members = Vec::with_capacity(rows.len());
                for (member, user) in rows {
                    let user = user.ok_or_else(|| {
                        crate::EngineError::Integrity(
                            "membership references a missing user".to_string(),
                        )
                    })?;
                    members.push((member, user));
                }

                Ok((group, members))
            }
            .await
        })
    }

    /// Deletes a group (owner only). Memberships, invites, expenses and
    /// their debts go with it via FK cascade; this joint destruction is the
    /// only way expense history ever disappears.
    pub async fn delete_group(&self, group_id: &str, actor_user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            async {
                let group = self
                    .require_group_owner(&db_tx, group_id, actor_user_id)
                    .await?;
                groups::Entity::delete_by_id(group.id).exec(&db_tx).await?;
                Ok(())
            }
            .await
        })
    }
}
