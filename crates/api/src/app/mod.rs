//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: one service per entity over a shared entity store
//! - `routes/`: HTTP routes + handlers (one file per entity)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use subhub_infra::config::{AppConfig, StoreBackend};
use subhub_infra::entity_store::{EntityStore, InMemoryEntityStore, PostgresEntityStore};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router for the configured store backend.
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    match &config.store {
        StoreBackend::InMemory => {
            tracing::info!("using in-memory entity store");
            Ok(router(AppServices::new(InMemoryEntityStore::new())))
        }
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            tracing::info!(max_connections, "using postgres entity store");
            let store = PostgresEntityStore::connect(database_url, *max_connections)
                .await
                .context("failed to connect to Postgres")?;
            store
                .ensure_schema()
                .await
                .context("failed to create database schema")?;
            Ok(router(AppServices::new(store)))
        }
    }
}

/// Router over an already wired set of services.
pub fn router<S>(services: AppServices<S>) -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route("/health", get(routes::system::health::<S>))
        .merge(routes::router::<S>())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::log_requests))
                .layer(Extension(Arc::new(services))),
        )
}
