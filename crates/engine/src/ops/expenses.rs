use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, DebtStatus, EngineError, Money, ResultEngine, debts, expenses, group_members,
};

use super::{Engine, normalize_optional_text, with_tx};

/// Parameters for [`Engine::record_expense`].
#[derive(Clone, Debug)]
pub struct NewExpense<'a> {
    pub group_id: &'a str,
    /// Whose gift this purchase was for. Must be a member and not the payer.
    pub birthday_user_id: &'a str,
    pub paid_by_user_id: &'a str,
    pub title: Option<&'a str>,
    pub amount_minor: i64,
    pub currency: Currency,
    /// Free-form account hint shown to debtors ("CBU ...", "Venmo @...").
    pub payment_account: &'a str,
    pub note: Option<&'a str>,
    /// When set, restricts the liable set to these members; otherwise every
    /// current member shares. Payer and birthday user are excluded either way.
    pub participants: Option<&'a [&'a str]>,
}

impl Engine {
    /// Records a gift purchase and fans it out into per-member debts.
    ///
    /// The liable set is every sharing member except the payer and the
    /// birthday user. The split is exact: shares differ by at most one minor
    /// unit and sum to the expense amount, with the larger shares landing on
    /// the lowest user ids. Expense and debts commit as one transaction.
    pub async fn record_expense(
        &self,
        params: NewExpense<'_>,
        now: DateTime<Utc>,
    ) -> ResultEngine<(expenses::Model, Vec<debts::Model>)> {
        let amount = Money::new(params.amount_minor, params.currency);
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        if params.birthday_user_id == params.paid_by_user_id {
            return Err(EngineError::Forbidden(
                "the payer cannot record an expense for their own gift".to_string(),
            ));
        }
        let title = normalize_optional_text(params.title);
        let note = normalize_optional_text(params.note);

        with_tx!(self, |db_tx| {
            async {
                self.require_group_member(&db_tx, params.group_id, params.paid_by_user_id)
                    .await?;
                self.membership(&db_tx, params.group_id, params.birthday_user_id)
                    .await?
                    .ok_or_else(|| {
                        EngineError::KeyNotFound(
                            "birthday user is not a member of this group".to_string(),
                        )
                    })?;

                let members = group_members::Entity::find()
                    .filter(group_members::Column::GroupId.eq(params.group_id.to_string()))
                    .all(&db_tx)
                    .await?;
                let member_ids: Vec<&str> =
                    members.iter().map(|m| m.user_id.as_str()).collect();

                let mut liable: Vec<&str> = match params.participants {
                    Some(chosen) => {
                        for user_id in chosen {
                            if !member_ids.contains(user_id) {
                                return Err(EngineError::KeyNotFound(
                                    "participant is not a member of this group".to_string(),
                                ));
                            }
                        }
                        chosen.to_vec()
                    }
                    None => member_ids,
                };
                liable.sort_unstable();
                liable.dedup();
                liable.retain(|id| {
                    *id != params.paid_by_user_id && *id != params.birthday_user_id
                });

                let expense = expenses::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    group_id: ActiveValue::Set(params.group_id.to_string()),
                    birthday_user_id: ActiveValue::Set(params.birthday_user_id.to_string()),
                    paid_by_user_id: ActiveValue::Set(params.paid_by_user_id.to_string()),
                    title: ActiveValue::Set(title.clone()),
                    amount_minor: ActiveValue::Set(params.amount_minor),
                    currency: ActiveValue::Set(params.currency.code().to_string()),
                    payment_account: ActiveValue::Set(params.payment_account.to_string()),
                    note: ActiveValue::Set(note.clone()),
                    created_at: ActiveValue::Set(now),
                }
                .insert(&db_tx)
                .await?;

                // An empty liable set is a valid expense with nothing owed.
                let mut rows = Vec::with_capacity(liable.len());
                if !liable.is_empty() {
                    let shares = amount.split_even(liable.len())?;
                    for (debtor, share) in liable.iter().zip(shares) {
                        let row = debts::ActiveModel {
                            id: ActiveValue::Set(Uuid::new_v4().to_string()),
                            expense_id: ActiveValue::Set(expense.id.clone()),
                            owed_by_user_id: ActiveValue::Set((*debtor).to_string()),
                            owed_to_user_id: ActiveValue::Set(
                                params.paid_by_user_id.to_string(),
                            ),
                            amount_minor: ActiveValue::Set(share.amount_minor()),
                            currency: ActiveValue::Set(share.currency().code().to_string()),
                            status: ActiveValue::Set(
                                DebtStatus::Pending.as_str().to_string(),
                            ),
                            paid_at: ActiveValue::Set(None),
                        }
                        .insert(&db_tx)
                        .await?;
                        rows.push(row);
                    }
                }

                Ok((expense, rows))
            }
            .await
        })
    }

    /// Expenses of a group, newest first, optionally narrowed to one
    /// birthday user (member-only read).
    pub async fn expenses_for_group(
        &self,
        group_id: &str,
        actor_user_id: &str,
        birthday_user_id: Option<&str>,
    ) -> ResultEngine<Vec<expenses::Model>> {
        with_tx!(self, |db_tx| {
            async {
                self.require_group_member(&db_tx, group_id, actor_user_id)
                    .await?;

                let mut query = expenses::Entity::find()
                    .filter(expenses::Column::GroupId.eq(group_id.to_string()));
                if let Some(birthday_user_id) = birthday_user_id {
                    query = query.filter(
                        expenses::Column::BirthdayUserId.eq(birthday_user_id.to_string()),
                    );
                }
                let rows = query
                    .order_by_desc(expenses::Column::CreatedAt)
                    .order_by_desc(expenses::Column::Id)
                    .all(&db_tx)
                    .await?;

                Ok(rows)
            }
            .await
        })
    }
}
