use axum::Router;

use subhub_infra::entity_store::EntityStore;

pub mod products;
pub mod subscriptions;
pub mod system;
pub mod users;

/// Router for all entity endpoints.
pub fn router<S>() -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .nest("/products", products::router::<S>())
        .nest("/users", users::router::<S>())
        .nest("/subscriptions", subscriptions::router::<S>())
}
