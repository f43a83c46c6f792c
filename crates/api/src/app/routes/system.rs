use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use subhub_infra::entity_store::EntityStore;

use crate::app::errors;
use crate::app::services::AppServices;

pub const SERVICE_NAME: &str = "subhub-api";

pub async fn health<S>(Extension(services): Extension<Arc<AppServices<S>>>) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    match services.health.check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "service": SERVICE_NAME,
                "status": "healthy",
                "timestamp": Utc::now(),
            })),
        )
            .into_response(),
        Err(e) => errors::json_error(StatusCode::SERVICE_UNAVAILABLE, "unhealthy", e.to_string()),
    }
}
