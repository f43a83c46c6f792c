//! Composed views returned by the service layer.
//!
//! Subscriptions are presented with their full product; users with all of
//! their subscriptions. Views are assembled inside the caller's transaction so
//! they are consistent with the write that produced them.

use subhub_core::Entity;
use subhub_products::Product;
use subhub_subscriptions::Subscription;
use subhub_users::User;

use crate::entity_store::{StoreError, StoreTx};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionView {
    pub subscription: Subscription,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub user: User,
    pub subscriptions: Vec<SubscriptionView>,
}

/// Attach the referenced product to a subscription.
pub async fn load_subscription_view<T>(
    tx: &mut T,
    subscription: Subscription,
) -> Result<SubscriptionView, StoreError>
where
    T: StoreTx,
{
    let product = tx
        .get_product(subscription.product_id())
        .await?
        .ok_or_else(|| {
            StoreError::Inconsistent(format!(
                "subscription {} references missing product {}",
                subscription.id(),
                subscription.product_id()
            ))
        })?;
    Ok(SubscriptionView {
        subscription,
        product,
    })
}

/// Attach all subscriptions (with products) to a user.
pub async fn load_user_view<T>(tx: &mut T, user: User) -> Result<UserView, StoreError>
where
    T: StoreTx,
{
    let subscriptions = tx.list_subscriptions_for_user(user.id()).await?;
    let mut views = Vec::with_capacity(subscriptions.len());
    for subscription in subscriptions {
        views.push(load_subscription_view(tx, subscription).await?);
    }
    Ok(UserView {
        user,
        subscriptions: views,
    })
}
