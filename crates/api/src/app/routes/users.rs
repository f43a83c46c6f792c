use std::sync::Arc;

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use subhub_core::UserId;
use subhub_infra::entity_store::EntityStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router<S>() -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route("/", post(create_user::<S>).get(list_users::<S>))
        .route("/by-email/:email", get(get_user_by_email::<S>))
        .route(
            "/:id",
            get(get_user::<S>).put(update_user::<S>).delete(delete_user::<S>),
        )
}

pub async fn create_user<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    body: Result<Json<dto::CreateUserRequest>, JsonRejection>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let user = match body.into_user() {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.users.create(user).await {
        Ok(view) => (StatusCode::CREATED, Json(dto::user_to_json(&view))).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

pub async fn list_users<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    match services.users.list().await {
        Ok(users) => {
            let items = users.iter().map(dto::user_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::user_error_to_response(e),
    }
}

pub async fn get_user<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let id: UserId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.users.get(id).await {
        Ok(view) => (StatusCode::OK, Json(dto::user_to_json(&view))).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

pub async fn get_user_by_email<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(email): Path<String>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    match services.users.get_by_email(email.trim()).await {
        Ok(view) => (StatusCode::OK, Json(dto::user_to_json(&view))).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

pub async fn update_user<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateUserRequest>, JsonRejection>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let id: UserId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let user = match body.into_user(id) {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.users.update(user).await {
        Ok(view) => (StatusCode::OK, Json(dto::user_to_json(&view))).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

pub async fn delete_user<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let id: UserId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.users.delete(id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}
