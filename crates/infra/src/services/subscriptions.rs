use thiserror::Error;
use tracing::instrument;

use subhub_core::{Entity, SubscriptionId};
use subhub_products::Product;
use subhub_subscriptions::{EligibilityViolation, Subscription, check_eligibility};

use super::{ServiceFailure, traced};
use crate::entity_store::{EntityStore, ForeignKey, StoreError, StoreTx, UniqueField};
use crate::read_model::{SubscriptionView, load_subscription_view};

#[derive(Debug, Error)]
pub enum SubscriptionServiceError {
    #[error("Subscription does not exist")]
    NotFound,

    #[error("ID already exists")]
    IdExists,

    #[error("Product does not exist")]
    ProductNotFound,

    #[error("User does not exist")]
    UserNotFound,

    #[error(transparent)]
    Ineligible(#[from] EligibilityViolation),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceFailure for SubscriptionServiceError {
    fn is_fault(&self) -> bool {
        matches!(self, SubscriptionServiceError::Store(_))
    }
}

fn map_write_error(err: StoreError) -> SubscriptionServiceError {
    match err {
        StoreError::UniqueViolation(UniqueField::SubscriptionId) => {
            SubscriptionServiceError::IdExists
        }
        StoreError::ForeignKeyViolation(ForeignKey::SubscriptionProduct) => {
            SubscriptionServiceError::ProductNotFound
        }
        StoreError::ForeignKeyViolation(ForeignKey::SubscriptionUser) => {
            SubscriptionServiceError::UserNotFound
        }
        other => SubscriptionServiceError::Store(other),
    }
}

/// Check that both referenced entities exist and the product accepts
/// subscriptions. Product first, then user, then eligibility.
async fn check_references<T: StoreTx>(
    tx: &mut T,
    subscription: &Subscription,
) -> Result<Product, SubscriptionServiceError> {
    let product = tx
        .get_product(subscription.product_id())
        .await?
        .ok_or(SubscriptionServiceError::ProductNotFound)?;
    tx.get_user(subscription.user_id())
        .await?
        .ok_or(SubscriptionServiceError::UserNotFound)?;
    check_eligibility(&product)?;
    Ok(product)
}

/// Subscription operations, eligibility rules included.
#[derive(Debug, Clone)]
pub struct SubscriptionService<S> {
    store: S,
}

impl<S: EntityStore> SubscriptionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(
        skip(self, subscription),
        fields(
            subscription_id = %subscription.id(),
            user_id = %subscription.user_id(),
            product_id = %subscription.product_id()
        )
    )]
    pub async fn create(
        &self,
        subscription: Subscription,
    ) -> Result<SubscriptionView, SubscriptionServiceError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let product = check_references(&mut tx, &subscription).await?;
            tx.insert_subscription(&subscription)
                .await
                .map_err(map_write_error)?;
            tx.commit().await?;
            Ok::<_, SubscriptionServiceError>(SubscriptionView {
                subscription,
                product,
            })
        }
        .await;
        traced("subscriptions.create", result)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: SubscriptionId) -> Result<SubscriptionView, SubscriptionServiceError> {
        let mut tx = self.store.begin().await?;
        let subscription = tx
            .get_subscription(id)
            .await?
            .ok_or(SubscriptionServiceError::NotFound)?;
        Ok(load_subscription_view(&mut tx, subscription).await?)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<SubscriptionView>, SubscriptionServiceError> {
        let mut tx = self.store.begin().await?;
        let subscriptions = tx.list_subscriptions().await?;
        let mut views = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            views.push(load_subscription_view(&mut tx, subscription).await?);
        }
        Ok(views)
    }

    /// Replace a subscription. The same reference and eligibility checks as
    /// `create` apply; a missing subscription is only detected at write time.
    #[instrument(
        skip(self, subscription),
        fields(
            subscription_id = %subscription.id(),
            user_id = %subscription.user_id(),
            product_id = %subscription.product_id()
        )
    )]
    pub async fn update(
        &self,
        subscription: Subscription,
    ) -> Result<SubscriptionView, SubscriptionServiceError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let product = check_references(&mut tx, &subscription).await?;
            let updated = tx
                .update_subscription(&subscription)
                .await
                .map_err(map_write_error)?
                .ok_or(SubscriptionServiceError::NotFound)?;
            tx.commit().await?;
            Ok::<_, SubscriptionServiceError>(SubscriptionView {
                subscription: updated,
                product,
            })
        }
        .await;
        traced("subscriptions.update", result)
    }

    /// Delete a subscription unconditionally and return what was removed.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        id: SubscriptionId,
    ) -> Result<SubscriptionView, SubscriptionServiceError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let deleted = tx
                .delete_subscription(id)
                .await?
                .ok_or(SubscriptionServiceError::NotFound)?;
            let view = load_subscription_view(&mut tx, deleted).await?;
            tx.commit().await?;
            Ok::<_, SubscriptionServiceError>(view)
        }
        .await;
        traced("subscriptions.delete", result)
    }
}
