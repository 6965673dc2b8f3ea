use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{EngineError, GroupRole, ResultEngine, group_members};

use super::{Engine, OwnerExitPolicy, with_tx};

impl Engine {
    /// Roster of a group, oldest member first (member-only read).
    pub async fn list_members(
        &self,
        group_id: &str,
        actor_user_id: &str,
    ) -> ResultEngine<Vec<group_members::Model>> {
        with_tx!(self, |db_tx| {
            async {
                self.require_group_member(&db_tx, group_id, actor_user_id)
                    .await?;
                let members = group_members::Entity::find()
                    .filter(group_members::Column::GroupId.eq(group_id.to_string()))
                    .order_by_asc(group_members::Column::JoinedAt)
                    .order_by_asc(group_members::Column::Id)
                    .all(&db_tx)
                    .await?;
                Ok(members)
            }
            .await
        })
    }

    /// Removes a member. Any member may remove any member, themselves
    /// included; removal never touches debts already fanned out.
    pub async fn remove_member(
        &self,
        group_id: &str,
        target_user_id: &str,
        actor_user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            async {
                self.require_group_member(&db_tx, group_id, actor_user_id)
                    .await?;
                let target = self
                    .membership(&db_tx, group_id, target_user_id)
                    .await?
                    .ok_or_else(|| {
                        EngineError::KeyNotFound("membership not exists".to_string())
                    })?;

                self.depart(&db_tx, group_id, target).await
            }
            .await
        })
    }

    /// A member removing themselves. Same succession rules as
    /// [`remove_member`](Engine::remove_member).
    pub async fn leave_group(&self, group_id: &str, user_id: &str) -> ResultEngine<()> {
        self.remove_member(group_id, user_id, user_id).await
    }

    /// Deletes the membership row, handing OWNER to the longest-standing
    /// remaining member when the departing member was the last owner (or
    /// refusing, per the configured policy). A sole member may always leave;
    /// the group then stands empty until deleted.
    async fn depart(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        target: group_members::Model,
    ) -> ResultEngine<()> {
        let leaving_owner = target.role == GroupRole::Owner.as_str();

        group_members::Entity::delete_by_id(target.id).exec(db).await?;

        if !leaving_owner {
            return Ok(());
        }

        let owners_left = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .filter(group_members::Column::Role.eq(GroupRole::Owner.as_str()))
            .one(db)
            .await?;
        if owners_left.is_some() {
            return Ok(());
        }

        let successor = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(group_members::Column::JoinedAt)
            .order_by_asc(group_members::Column::Id)
            .one(db)
            .await?;
        let Some(successor) = successor else {
            // Group is now empty; nothing to promote.
            return Ok(());
        };

        match self.owner_exit {
            OwnerExitPolicy::PromoteOldest => {
                group_members::ActiveModel {
                    id: ActiveValue::Set(successor.id),
                    role: ActiveValue::Set(GroupRole::Owner.as_str().to_string()),
                    ..Default::default()
                }
                .update(db)
                .await?;
                Ok(())
            }
            // Rolled back by the caller's transaction.
            OwnerExitPolicy::Block => Err(EngineError::LastOwnerCannotLeave),
        }
    }
}
