use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{EngineError, GroupRole, ResultEngine, group_invites, group_members, groups};

use super::{Engine, is_unique_violation, with_tx};

/// Random bytes per token, before base64url encoding.
const TOKEN_BYTES: usize = 32;
/// Retries when a freshly generated token collides with an existing one.
const TOKEN_INSERT_ATTEMPTS: usize = 3;

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl Engine {
    /// Inserts an invite row, regenerating the token on the (astronomically
    /// unlikely) unique collision.
    pub(super) async fn insert_invite(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        created_by_user_id: &str,
        expires_at: Option<DateTime<Utc>>,
        max_uses: Option<i32>,
        now: DateTime<Utc>,
    ) -> ResultEngine<group_invites::Model> {
        for _ in 0..TOKEN_INSERT_ATTEMPTS {
            let attempt = group_invites::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                group_id: ActiveValue::Set(group_id.to_string()),
                token: ActiveValue::Set(new_token()),
                created_by_user_id: ActiveValue::Set(created_by_user_id.to_string()),
                created_at: ActiveValue::Set(now),
                expires_at: ActiveValue::Set(expires_at),
                max_uses: ActiveValue::Set(max_uses),
                uses_count: ActiveValue::Set(0),
                is_active: ActiveValue::Set(true),
            }
            .insert(db)
            .await;

            match attempt {
                Ok(invite) => return Ok(invite),
                Err(err) if is_unique_violation(&err) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(EngineError::Integrity(
            "could not mint a unique invite token".to_string(),
        ))
    }

    /// Mints a fresh invite token for a group. Any member may invite.
    pub async fn create_invite(
        &self,
        group_id: &str,
        actor_user_id: &str,
        expires_at: Option<DateTime<Utc>>,
        max_uses: Option<i32>,
        now: DateTime<Utc>,
    ) -> ResultEngine<group_invites::Model> {
        if max_uses.is_some_and(|n| n <= 0) {
            return Err(EngineError::InvalidAmount(
                "max_uses must be > 0 when set".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            async {
                self.require_group_member(&db_tx, group_id, actor_user_id)
                    .await?;
                self.insert_invite(&db_tx, group_id, actor_user_id, expires_at, max_uses, now)
                    .await
            }
            .await
        })
    }

    /// Deactivates an invite so it can never be redeemed again.
    pub async fn revoke_invite(
        &self,
        token: &str,
        actor_user_id: &str,
    ) -> ResultEngine<group_invites::Model> {
        with_tx!(self, |db_tx| {
            async {
                let invite = find_invite(&db_tx, token).await?;
                self.require_group_member(&db_tx, &invite.group_id, actor_user_id)
                    .await?;

                let updated = group_invites::ActiveModel {
                    id: ActiveValue::Set(invite.id),
                    is_active: ActiveValue::Set(false),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;

                Ok(updated)
            }
            .await
        })
    }

    /// Preview of what a token unlocks, for the pre-login landing page.
    /// Returns the invite and its group name; does not require auth and does
    /// not reveal the roster.
    pub async fn invite_info(
        &self,
        token: &str,
    ) -> ResultEngine<(group_invites::Model, String)> {
        let invite = group_invites::Entity::find()
            .filter(group_invites::Column::Token.eq(token.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("invite not exists".to_string()))?;

        let group = groups::Entity::find_by_id(invite.group_id.clone())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))?;

        Ok((invite, group.name))
    }

    /// Redeems an invite token for `user_id`, creating a MEMBER row.
    ///
    /// The use-count consumption is a single conditional UPDATE whose WHERE
    /// clause re-checks the whole redeemability predicate, so two concurrent
    /// redemptions of a one-use token can never both succeed: the loser's
    /// update matches zero rows and we re-read to name the reason.
    pub async fn redeem_invite(
        &self,
        token: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<group_members::Model> {
        with_tx!(self, |db_tx| {
            async {
                self.require_user_exists(&db_tx, user_id).await?;
                let invite = find_invite(&db_tx, token).await?;
                check_redeemable(&invite, now)?;

                if self
                    .membership(&db_tx, &invite.group_id, user_id)
                    .await?
                    .is_some()
                {
                    return Err(EngineError::AlreadyMember);
                }

                let consumed = group_invites::Entity::update_many()
                    .col_expr(
                        group_invites::Column::UsesCount,
                        Expr::col(group_invites::Column::UsesCount).add(1),
                    )
                    .filter(group_invites::Column::Id.eq(invite.id.clone()))
                    .filter(group_invites::Column::IsActive.eq(true))
                    .filter(
                        Condition::any()
                            .add(group_invites::Column::ExpiresAt.is_null())
                            .add(group_invites::Column::ExpiresAt.gt(now)),
                    )
                    .filter(
                        Condition::any()
                            .add(group_invites::Column::MaxUses.is_null())
                            .add(
                                Expr::col(group_invites::Column::UsesCount)
                                    .lt(Expr::col(group_invites::Column::MaxUses)),
                            ),
                    )
                    .exec(&db_tx)
                    .await?;

                if consumed.rows_affected == 0 {
                    // Lost a race since the read above; re-read for the reason.
                    let current = find_invite(&db_tx, token).await?;
                    check_redeemable(&current, now)?;
                    return Err(EngineError::Integrity(
                        "invite consumption matched no rows".to_string(),
                    ));
                }

                let inserted = group_members::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    group_id: ActiveValue::Set(invite.group_id.clone()),
                    user_id: ActiveValue::Set(user_id.to_string()),
                    role: ActiveValue::Set(GroupRole::Member.as_str().to_string()),
                    joined_at: ActiveValue::Set(now),
                }
                .insert(&db_tx)
                .await;

                match inserted {
                    Ok(member) => Ok(member),
                    // Concurrent join through another invite.
                    Err(err) if is_unique_violation(&err) => Err(EngineError::AlreadyMember),
                    Err(err) => Err(err.into()),
                }
            }
            .await
        })
    }
}

async fn find_invite(
    db: &DatabaseTransaction,
    token: &str,
) -> ResultEngine<group_invites::Model> {
    group_invites::Entity::find()
        .filter(group_invites::Column::Token.eq(token.to_string()))
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("invite not exists".to_string()))
}

fn check_redeemable(invite: &group_invites::Model, now: DateTime<Utc>) -> ResultEngine<()> {
    if !invite.is_active {
        return Err(EngineError::InviteInactive);
    }
    if invite.expires_at.is_some_and(|at| at <= now) {
        return Err(EngineError::InviteExpired);
    }
    if invite.max_uses.is_some_and(|cap| invite.uses_count >= cap) {
        return Err(EngineError::InviteExhausted);
    }
    Ok(())
}
