//! Expense endpoints

use api_types::expense::{Expense, ExpenseNew, ExpenseWithDebts};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;

use crate::{ServerError, currency_from_api, currency_from_code, debts, server::ServerState, user};
use engine::NewExpense;

pub(crate) fn to_api(expense: engine::expenses::Model) -> Result<Expense, ServerError> {
    Ok(Expense {
        id: expense.id,
        group_id: expense.group_id,
        birthday_user_id: expense.birthday_user_id,
        paid_by_user_id: expense.paid_by_user_id,
        title: expense.title,
        amount_minor: expense.amount_minor,
        currency: currency_from_code(&expense.currency)?,
        payment_account: expense.payment_account,
        note: expense.note,
        created_at: expense.created_at,
    })
}

/// Handle requests for recording a gift purchase. The payer is the caller;
/// the engine fans the amount out into per-member debts.
pub async fn expense_new(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Json(payload): Json<ExpenseNew>,
) -> Result<Json<ExpenseWithDebts>, ServerError> {
    let participants: Option<Vec<&str>> = payload
        .participants
        .as_ref()
        .map(|ids| ids.iter().map(String::as_str).collect());

    let (expense, debt_rows) = state
        .engine
        .record_expense(
            NewExpense {
                group_id: &group_id,
                birthday_user_id: &payload.birthday_user_id,
                paid_by_user_id: &account.id,
                title: payload.title.as_deref(),
                amount_minor: payload.amount_minor,
                currency: currency_from_api(payload.currency),
                payment_account: &payload.payment_account,
                note: payload.note.as_deref(),
                participants: participants.as_deref(),
            },
            Utc::now(),
        )
        .await?;

    Ok(Json(ExpenseWithDebts {
        expense: to_api(expense)?,
        debts: debt_rows
            .into_iter()
            .map(debts::to_api)
            .collect::<Result<Vec<_>, _>>()?,
    }))
}

#[derive(Deserialize)]
pub struct ExpenseFilter {
    pub birthday_user_id: Option<String>,
}

pub async fn list(
    Extension(account): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, ServerError> {
    let rows = state
        .engine
        .expenses_for_group(&group_id, &account.id, filter.birthday_user_id.as_deref())
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(to_api)
            .collect::<Result<Vec<_>, _>>()?,
    ))
}
