use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, group_members, groups, users};

use super::Engine;

impl Engine {
    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_group(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<groups::Model> {
        groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))
    }

    pub(super) async fn membership(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<group_members::Model>> {
        group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .filter(group_members::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// The group must exist and `user_id` must be one of its members.
    pub(super) async fn require_group_member(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<(groups::Model, group_members::Model)> {
        let group = self.require_group(db, group_id).await?;
        let member = self
            .membership(db, group_id, user_id)
            .await?
            .ok_or_else(|| EngineError::Forbidden("not a member of this group".to_string()))?;
        Ok((group, member))
    }

    pub(super) async fn require_group_owner(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<groups::Model> {
        let (group, member) = self.require_group_member(db, group_id, user_id).await?;
        if member.role != crate::GroupRole::Owner.as_str() {
            return Err(EngineError::Forbidden("not a group owner".to_string()));
        }
        Ok(group)
    }
}
