use std::sync::Arc;

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use subhub_core::SubscriptionId;
use subhub_infra::entity_store::EntityStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router<S>() -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route("/", post(create_subscription::<S>).get(list_subscriptions::<S>))
        .route(
            "/:id",
            get(get_subscription::<S>)
                .put(update_subscription::<S>)
                .delete(delete_subscription::<S>),
        )
}

pub async fn create_subscription<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    body: Result<Json<dto::CreateSubscriptionRequest>, JsonRejection>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match services.subscriptions.create(body.into_subscription()).await {
        Ok(view) => (StatusCode::CREATED, Json(dto::subscription_to_json(&view))).into_response(),
        Err(e) => errors::subscription_error_to_response(e),
    }
}

pub async fn list_subscriptions<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    match services.subscriptions.list().await {
        Ok(views) => {
            let items = views.iter().map(dto::subscription_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::subscription_error_to_response(e),
    }
}

pub async fn get_subscription<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let id: SubscriptionId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.subscriptions.get(id).await {
        Ok(view) => (StatusCode::OK, Json(dto::subscription_to_json(&view))).into_response(),
        Err(e) => errors::subscription_error_to_response(e),
    }
}

pub async fn update_subscription<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateSubscriptionRequest>, JsonRejection>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let id: SubscriptionId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    match services.subscriptions.update(body.into_subscription(id)).await {
        Ok(view) => (StatusCode::OK, Json(dto::subscription_to_json(&view))).into_response(),
        Err(e) => errors::subscription_error_to_response(e),
    }
}

pub async fn delete_subscription<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let id: SubscriptionId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.subscriptions.delete(id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::subscription_error_to_response(e),
    }
}
