use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod contributions;
mod debts;
mod expenses;
mod groups;
mod invites;
mod items;
mod members;
mod server;
mod user;

pub mod types {
    pub mod item {
        pub use api_types::item::{FundingStatus, Item, ItemNew, ItemType};
    }

    pub mod contribution {
        pub use api_types::contribution::{Contribution, ContributionNew};
    }

    pub mod group {
        pub use api_types::group::{GroupCreated, GroupDetail, GroupNew, GroupRename, GroupSummary};
    }

    pub mod invite {
        pub use api_types::invite::{Invite, InviteInfo, InviteNew};
    }

    pub mod member {
        pub use api_types::member::{Member, Role};
    }

    pub mod expense {
        pub use api_types::expense::{Expense, ExpenseNew, ExpenseWithDebts};
    }

    pub mod debt {
        pub use api_types::balance::Balances;
        pub use api_types::debt::{Debt, Status};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InviteInactive
        | EngineError::InviteExpired
        | EngineError::InviteExhausted
        | EngineError::AlreadyMember
        | EngineError::AlreadySettled
        | EngineError::LastOwnerCannotLeave => StatusCode::CONFLICT,
        EngineError::Database(_) | EngineError::Integrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidItemType(_)
        | EngineError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Integrity(detail) => {
            tracing::error!("integrity error: {detail}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

fn currency_to_api(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Uyu => api_types::Currency::Uyu,
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Eur => api_types::Currency::Eur,
    }
}

fn currency_from_api(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Uyu => engine::Currency::Uyu,
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Eur => engine::Currency::Eur,
    }
}

/// Currency codes stored in the DB round-trip through the engine enum.
fn currency_from_code(code: &str) -> Result<api_types::Currency, ServerError> {
    let currency = engine::Currency::try_from(code)?;
    Ok(currency_to_api(currency))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res =
            ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflicts_map_to_409() {
        for err in [
            EngineError::InviteExpired,
            EngineError::InviteExhausted,
            EngineError::AlreadyMember,
            EngineError::AlreadySettled,
            EngineError::LastOwnerCannotLeave,
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_database_maps_to_500_without_detail() {
        let res = ServerError::from(EngineError::Integrity("secret".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
