//! Debt and balance endpoints

use api_types::balance::{BalanceLine, Balances};
use api_types::debt::{Debt, Status};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;

use crate::{ServerError, currency_from_code, server::ServerState, user};
use engine::DebtStatus;

pub(crate) fn to_api(debt: engine::debts::Model) -> Result<Debt, ServerError> {
    let status = match DebtStatus::try_from(debt.status.as_str())? {
        DebtStatus::Pending => Status::Pending,
        DebtStatus::Paid => Status::Paid,
    };
    Ok(Debt {
        id: debt.id,
        expense_id: debt.expense_id,
        owed_by_user_id: debt.owed_by_user_id,
        owed_to_user_id: debt.owed_to_user_id,
        amount_minor: debt.amount_minor,
        currency: currency_from_code(&debt.currency)?,
        status,
        paid_at: debt.paid_at,
    })
}

pub async fn list_for_expense(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<String>,
) -> Result<Json<Vec<Debt>>, ServerError> {
    let rows = state
        .engine
        .debts_for_expense(&expense_id, &account.id)
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(to_api)
            .collect::<Result<Vec<_>, _>>()?,
    ))
}

/// Handle requests for settling a debt (debtor or creditor only)
pub async fn settle(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(debt_id): Path<String>,
) -> Result<Json<Debt>, ServerError> {
    let debt = state
        .engine
        .settle_debt(&debt_id, &account.id, Utc::now())
        .await?;
    Ok(Json(to_api(debt)?))
}

fn lines(raw: Vec<(String, i64)>) -> Result<Vec<BalanceLine>, ServerError> {
    raw.into_iter()
        .map(|(code, amount_minor)| {
            Ok(BalanceLine {
                currency: currency_from_code(&code)?,
                amount_minor,
            })
        })
        .collect()
}

/// The caller's PENDING standing within one group, one line per currency.
pub async fn balances(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<Balances>, ServerError> {
    let balances = state.engine.balances(&group_id, &account.id).await?;

    Ok(Json(Balances {
        owed_to_me: lines(balances.owed_to_me)?,
        i_owe: lines(balances.i_owe)?,
    }))
}
