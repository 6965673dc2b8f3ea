use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{contributions, debts, expenses, groups, invites, items, members, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// HTTP Basic: username is the account email, password is the stored
/// credential. Hashing happens client-side at provisioning time; the server
/// compares the stored value as an opaque string.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(auth_header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let account: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Email.eq(auth_header.username()))
        .filter(user::Column::HashedPassword.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(account) = account else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    let authed = Router::new()
        .route("/items", post(items::item_new))
        .route("/items/{item_id}", get(items::get))
        .route("/items/{item_id}/funding", get(items::funding))
        .route(
            "/items/{item_id}/contributions",
            post(contributions::contribution_new),
        )
        .route("/groups", post(groups::group_new).get(groups::list))
        .route(
            "/groups/{group_id}",
            get(groups::detail)
                .patch(groups::rename)
                .delete(groups::delete),
        )
        .route("/groups/{group_id}/members", get(members::list))
        .route(
            "/groups/{group_id}/members/{user_id}",
            delete(members::remove),
        )
        .route("/groups/{group_id}/leave", post(members::leave))
        .route("/groups/{group_id}/invites", post(invites::invite_new))
        .route("/invites/{token}/redeem", post(invites::redeem))
        .route("/invites/{token}/revoke", post(invites::revoke))
        .route(
            "/groups/{group_id}/expenses",
            post(expenses::expense_new).get(expenses::list),
        )
        .route("/expenses/{expense_id}/debts", get(debts::list_for_expense))
        .route("/debts/{debt_id}/settle", post(debts::settle))
        .route("/groups/{group_id}/balances", get(debts::balances))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    // Invite preview stays public so the token can land on a pre-login page.
    let public = Router::new().route("/invites/{token}", get(invites::info));

    authed.merge(public).with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ActiveModelTrait, ActiveValue, Database};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        user::ActiveModel {
            id: ActiveValue::Set("alice".to_string()),
            name: ActiveValue::Set("Alice".to_string()),
            email: ActiveValue::Set("alice@example.com".to_string()),
            hashed_password: ActiveValue::Set("secret".to_string()),
            birthday: ActiveValue::Set(None),
            created_at: ActiveValue::Set(chrono::Utc::now()),
        }
        .insert(&db)
        .await
        .unwrap();

        let engine = Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();
        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic_auth(email: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{email}:{password}")))
    }

    fn authed_json(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth("alice@example.com", "secret"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn requests_without_credentials_are_unauthorized() {
        let app = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/groups")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/groups")
                    .header(
                        header::AUTHORIZATION,
                        basic_auth("alice@example.com", "wrong"),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn pooled_item_funding_round_trip() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(authed_json(
                "POST",
                "/items",
                serde_json::json!({
                    "title": "Espresso machine",
                    "item_type": "POOLED",
                    "target_amount_minor": 10_000,
                    "currency": "UYU",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let item = json_body(response).await;
        let item_id = item["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(authed_json(
                "POST",
                &format!("/items/{item_id}/contributions"),
                serde_json::json!({
                    "contributor_name": "Ana",
                    "amount_minor": 4_000,
                    "currency": "UYU",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/items/{item_id}/funding"))
                    .header(
                        header::AUTHORIZATION,
                        basic_auth("alice@example.com", "secret"),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let funding = json_body(response).await;
        assert_eq!(funding["current_amount_minor"], 4_000);
        assert_eq!(funding["contributions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invite_info_is_reachable_without_auth() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(authed_json(
                "POST",
                "/groups",
                serde_json::json!({ "name": "Familia" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let group = json_body(response).await;
        let token = group["invite_token"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/invites/{token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let info = json_body(response).await;
        assert_eq!(info["group_name"], "Familia");
        assert_eq!(info["is_active"], true);
    }

    #[tokio::test]
    async fn engine_conflicts_surface_as_409() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(authed_json(
                "POST",
                "/groups",
                serde_json::json!({ "name": "Familia" }),
            ))
            .await
            .unwrap();
        let group = json_body(response).await;
        let token = group["invite_token"].as_str().unwrap().to_string();

        // The creator is already a member.
        let response = app
            .oneshot(authed_json(
                "POST",
                &format!("/invites/{token}/redeem"),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
