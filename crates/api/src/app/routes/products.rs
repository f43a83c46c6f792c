use std::sync::Arc;

use axum::{
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use subhub_core::ProductId;
use subhub_infra::entity_store::EntityStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router<S>() -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route("/", post(create_product::<S>).get(list_products::<S>))
        .route("/by-name/:name", get(get_product_by_name::<S>))
        .route(
            "/:id",
            get(get_product::<S>)
                .put(update_product::<S>)
                .delete(delete_product::<S>),
        )
}

pub async fn create_product<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let product = match body.into_product() {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.products.create(product).await {
        Ok(p) => (StatusCode::CREATED, Json(dto::product_to_json(&p))).into_response(),
        Err(e) => errors::product_error_to_response(e),
    }
}

pub async fn list_products<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    match services.products.list().await {
        Ok(products) => {
            let items = products.iter().map(dto::product_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::product_error_to_response(e),
    }
}

pub async fn get_product<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.products.get(id).await {
        Ok(p) => (StatusCode::OK, Json(dto::product_to_json(&p))).into_response(),
        Err(e) => errors::product_error_to_response(e),
    }
}

pub async fn get_product_by_name<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(name): Path<String>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    match services.products.get_by_name(&name).await {
        Ok(p) => (StatusCode::OK, Json(dto::product_to_json(&p))).into_response(),
        Err(e) => errors::product_error_to_response(e),
    }
}

pub async fn update_product<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let product = match body.into_product(id) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.products.update(product).await {
        Ok(p) => (StatusCode::OK, Json(dto::product_to_json(&p))).into_response(),
        Err(e) => errors::product_error_to_response(e),
    }
}

pub async fn delete_product<S>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response
where
    S: EntityStore + 'static,
{
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.products.delete(id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::product_error_to_response(e),
    }
}
