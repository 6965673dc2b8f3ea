use chrono::{DateTime, Utc};
use sea_orm::{
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{DebtStatus, EngineError, ResultEngine, debts, expenses};

use super::{Engine, with_tx};

/// A user's standing within one group, one line per currency.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Balances {
    /// Pending amounts owed **to** the user, keyed by currency code.
    pub owed_to_me: Vec<(String, i64)>,
    /// Pending amounts the user owes, keyed by currency code.
    pub i_owe: Vec<(String, i64)>,
}

impl Engine {
    /// Marks a debt PAID. Only the debtor or the creditor may settle, and
    /// settlement is irreversible.
    ///
    /// The transition is a conditional UPDATE filtered on PENDING; a second
    /// settlement matches zero rows and reports [`AlreadySettled`] instead
    /// of silently rewriting `paid_at`.
    ///
    /// [`AlreadySettled`]: EngineError::AlreadySettled
    pub async fn settle_debt(
        &self,
        debt_id: &str,
        actor_user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<debts::Model> {
        with_tx!(self, |db_tx| {
            async {
                let debt = debts::Entity::find_by_id(debt_id.to_string())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("debt not exists".to_string()))?;

                if actor_user_id != debt.owed_by_user_id
                    && actor_user_id != debt.owed_to_user_id
                {
                    return Err(EngineError::Forbidden(
                        "only the debtor or the creditor may settle a debt".to_string(),
                    ));
                }

                let updated = debts::Entity::update_many()
                    .col_expr(debts::Column::Status, Expr::value(DebtStatus::Paid.as_str()))
                    .col_expr(debts::Column::PaidAt, Expr::value(now))
                    .filter(debts::Column::Id.eq(debt_id.to_string()))
                    .filter(debts::Column::Status.eq(DebtStatus::Pending.as_str()))
                    .exec(&db_tx)
                    .await?;
                if updated.rows_affected == 0 {
                    return Err(EngineError::AlreadySettled);
                }

                let settled = debts::Entity::find_by_id(debt_id.to_string())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| {
                        EngineError::Integrity("debt vanished mid-settlement".to_string())
                    })?;
                Ok(settled)
            }
            .await
        })
    }

    /// Debts of one expense, visible to any member of the expense's group.
    pub async fn debts_for_expense(
        &self,
        expense_id: &str,
        actor_user_id: &str,
    ) -> ResultEngine<Vec<debts::Model>> {
        with_tx!(self, |db_tx| {
            async {
                let expense = expenses::Entity::find_by_id(expense_id.to_string())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| {
                        EngineError::KeyNotFound("expense not exists".to_string())
                    })?;
                self.require_group_member(&db_tx, &expense.group_id, actor_user_id)
                    .await?;

                let rows = debts::Entity::find()
                    .filter(debts::Column::ExpenseId.eq(expense_id.to_string()))
                    .order_by_asc(debts::Column::OwedByUserId)
                    .all(&db_tx)
                    .await?;
                Ok(rows)
            }
            .await
        })
    }

    /// The user's PENDING standing inside one group, summed per currency.
    /// Amounts of different currencies are never merged.
    pub async fn balances(&self, group_id: &str, user_id: &str) -> ResultEngine<Balances> {
        with_tx!(self, |db_tx| {
            async {
                self.require_group_member(&db_tx, group_id, user_id).await?;

                let pending = |column: debts::Column| {
                    debts::Entity::find()
                        .join(JoinType::InnerJoin, debts::Relation::Expenses.def())
                        .filter(expenses::Column::GroupId.eq(group_id.to_string()))
                        .filter(column.eq(user_id.to_string()))
                        .filter(debts::Column::Status.eq(DebtStatus::Pending.as_str()))
                };

                let mut balances = Balances::default();
                for debt in pending(debts::Column::OwedToUserId).all(&db_tx).await? {
                    accumulate(&mut balances.owed_to_me, &debt.currency, debt.amount_minor);
                }
                for debt in pending(debts::Column::OwedByUserId).all(&db_tx).await? {
                    accumulate(&mut balances.i_owe, &debt.currency, debt.amount_minor);
                }

                balances.owed_to_me.sort();
                balances.i_owe.sort();
                Ok(balances)
            }
            .await
        })
    }
}

fn accumulate(lines: &mut Vec<(String, i64)>, currency: &str, amount_minor: i64) {
    match lines.iter_mut().find(|(code, _)| code == currency) {
        Some((_, total)) => *total += amount_minor,
        None => lines.push((currency.to_string(), amount_minor)),
    }
}
