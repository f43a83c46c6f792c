use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use subhub_core::DomainError;
use subhub_infra::entity_store::StoreError;
use subhub_infra::services::{ProductServiceError, SubscriptionServiceError, UserServiceError};

pub fn product_error_to_response(err: ProductServiceError) -> axum::response::Response {
    match err {
        ProductServiceError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        ProductServiceError::IdExists => json_error(StatusCode::CONFLICT, "id_exists", err.to_string()),
        ProductServiceError::NameExists => {
            json_error(StatusCode::CONFLICT, "name_exists", err.to_string())
        }
        ProductServiceError::Lifecycle(violation) => json_error(
            StatusCode::CONFLICT,
            "lifecycle_violation",
            violation.to_string(),
        ),
        ProductServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn user_error_to_response(err: UserServiceError) -> axum::response::Response {
    match err {
        UserServiceError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        UserServiceError::IdExists => json_error(StatusCode::CONFLICT, "id_exists", err.to_string()),
        UserServiceError::EmailExists => {
            json_error(StatusCode::CONFLICT, "email_exists", err.to_string())
        }
        UserServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn subscription_error_to_response(err: SubscriptionServiceError) -> axum::response::Response {
    match err {
        SubscriptionServiceError::NotFound
        | SubscriptionServiceError::ProductNotFound
        | SubscriptionServiceError::UserNotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        SubscriptionServiceError::IdExists => {
            json_error(StatusCode::CONFLICT, "id_exists", err.to_string())
        }
        SubscriptionServiceError::Ineligible(violation) => json_error(
            StatusCode::CONFLICT,
            "product_not_published",
            violation.to_string(),
        ),
        SubscriptionServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "store_error",
        err.to_string(),
    )
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Render a body extraction failure with the usual error shape, keeping
/// axum's status.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(rejection.status(), "validation_error", rejection.body_text())
}

/// Unwrap a JSON body or render its rejection.
pub fn json_body<T>(
    body: Result<axum::Json<T>, JsonRejection>,
) -> Result<T, axum::response::Response> {
    body.map(|axum::Json(inner)| inner)
        .map_err(json_rejection_to_response)
}

/// Parse a path id, rendering failures as `400 invalid_id`.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: std::str::FromStr<Err = DomainError>,
{
    raw.parse().map_err(domain_error_to_response)
}
