//! Service wiring: every service shares one entity store handle.

use subhub_infra::entity_store::EntityStore;
use subhub_infra::services::{HealthService, ProductService, SubscriptionService, UserService};

pub struct AppServices<S> {
    pub products: ProductService<S>,
    pub users: UserService<S>,
    pub subscriptions: SubscriptionService<S>,
    pub health: HealthService<S>,
}

impl<S> AppServices<S>
where
    S: EntityStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            products: ProductService::new(store.clone()),
            users: UserService::new(store.clone()),
            subscriptions: SubscriptionService::new(store.clone()),
            health: HealthService::new(store),
        }
    }
}
