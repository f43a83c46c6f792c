use tracing::instrument;

use crate::entity_store::{EntityStore, StoreError};

/// Store liveness for health endpoints.
#[derive(Debug, Clone)]
pub struct HealthService<S> {
    store: S,
}

impl<S: EntityStore> HealthService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn check(&self) -> Result<(), StoreError> {
        let result = self.store.ping().await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "entity store ping failed");
        }
        result
    }
}
