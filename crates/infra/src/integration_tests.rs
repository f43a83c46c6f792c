//! Integration tests for the service pipeline.
//!
//! Tests: Service → EntityStore transaction → domain rules → commit
//!
//! Verifies:
//! - Lifecycle and eligibility rejections leave the store unchanged
//! - Reasons are reported in the documented precedence order
//! - Repeated no-op updates are idempotent

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use subhub_core::{Entity, ProductId, SubscriptionId, UserId};
    use subhub_products::{MonthlyFee, Product, ProductStatus};
    use subhub_subscriptions::Subscription;
    use subhub_users::{Email, User};

    use crate::entity_store::InMemoryEntityStore;
    use crate::services::{
        HealthService, ProductService, ProductServiceError, SubscriptionService,
        SubscriptionServiceError, UserService,
    };

    struct Services {
        products: ProductService<InMemoryEntityStore>,
        users: UserService<InMemoryEntityStore>,
        subscriptions: SubscriptionService<InMemoryEntityStore>,
        health: HealthService<InMemoryEntityStore>,
    }

    fn setup() -> Services {
        let store = InMemoryEntityStore::new();
        Services {
            products: ProductService::new(store.clone()),
            users: UserService::new(store.clone()),
            subscriptions: SubscriptionService::new(store.clone()),
            health: HealthService::new(store),
        }
    }

    fn product(id: ProductId, name: &str, status: ProductStatus) -> Product {
        Product::new(
            id,
            MonthlyFee::new(Decimal::new(1999, 2)).unwrap(),
            name,
            status,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn product_freezes_once_published() {
        let svc = setup();
        let id = ProductId::new();
        let draft = svc
            .products
            .create(product(id, "Pro", ProductStatus::Draft))
            .await
            .unwrap();

        let published = svc
            .products
            .update(draft.with_status(ProductStatus::Published))
            .await
            .unwrap();
        assert_eq!(published.status(), ProductStatus::Published);

        let err = svc
            .products
            .update(product(id, "Pro Max", ProductStatus::Published))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot modify non-status attributes of a published product"
        );

        let err = svc
            .products
            .update(published.with_status(ProductStatus::Draft))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot change status from published to draft"
        );

        let err = svc.products.delete(id).await.unwrap_err();
        assert_eq!(err.to_string(), "Product status is published");

        assert_eq!(svc.products.get(id).await.unwrap(), published);
    }

    #[tokio::test]
    async fn subscription_rejected_after_product_deprecation() {
        let svc = setup();
        let user = User::new(UserId::new(), Email::parse("u@example.com").unwrap());
        svc.users.create(user.clone()).await.unwrap();
        let p = svc
            .products
            .create(product(ProductId::new(), "Basic", ProductStatus::Published))
            .await
            .unwrap();

        let sub = Subscription::new(SubscriptionId::new(), true, user.id(), p.id());
        svc.subscriptions.create(sub).await.unwrap();

        svc.products
            .update(p.with_status(ProductStatus::Deprecated))
            .await
            .unwrap();

        let toggled = Subscription::new(sub.id(), false, user.id(), p.id());
        let err = svc.subscriptions.update(toggled).await.unwrap_err();
        assert_eq!(err.to_string(), "Product is in deprecated status");

        let stored = svc.subscriptions.get(sub.id()).await.unwrap();
        assert!(stored.subscription.is_active());
    }

    #[tokio::test]
    async fn identical_updates_are_repeatable_no_ops() {
        let svc = setup();
        for status in ProductStatus::ALL {
            let p = svc
                .products
                .create(product(ProductId::new(), status.as_str(), status))
                .await
                .unwrap();
            for _ in 0..3 {
                assert_eq!(svc.products.update(p.clone()).await.unwrap(), p);
            }
        }
    }

    #[tokio::test]
    async fn ineligible_subscription_leaves_store_unchanged() {
        let svc = setup();
        let user = User::new(UserId::new(), Email::parse("u@example.com").unwrap());
        svc.users.create(user.clone()).await.unwrap();
        let draft = svc
            .products
            .create(product(ProductId::new(), "Draft", ProductStatus::Draft))
            .await
            .unwrap();

        let err = svc
            .subscriptions
            .create(Subscription::new(
                SubscriptionId::new(),
                true,
                user.id(),
                draft.id(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionServiceError::Ineligible(_)));
        assert!(svc.subscriptions.list().await.unwrap().is_empty());
        assert!(
            svc.users
                .get(user.id())
                .await
                .unwrap()
                .subscriptions
                .is_empty()
        );
    }

    #[tokio::test]
    async fn user_view_lists_subscriptions_and_delete_cascades() {
        let svc = setup();
        let user = User::new(UserId::new(), Email::parse("u@example.com").unwrap());
        svc.users.create(user.clone()).await.unwrap();
        let p = svc
            .products
            .create(product(ProductId::new(), "Basic", ProductStatus::Published))
            .await
            .unwrap();
        let sub = Subscription::new(SubscriptionId::new(), true, user.id(), p.id());
        svc.subscriptions.create(sub).await.unwrap();

        let view = svc.users.get(user.id()).await.unwrap();
        assert_eq!(view.subscriptions.len(), 1);
        assert_eq!(view.subscriptions[0].product, p);

        let deleted = svc.users.delete(user.id()).await.unwrap();
        assert_eq!(deleted, view);
        assert!(svc.subscriptions.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_draft_is_gone() {
        let svc = setup();
        let id = ProductId::new();
        svc.products
            .create(product(id, "Draft", ProductStatus::Draft))
            .await
            .unwrap();
        svc.products.delete(id).await.unwrap();
        assert!(matches!(
            svc.products.get(id).await.unwrap_err(),
            ProductServiceError::NotFound
        ));
    }

    #[tokio::test]
    async fn in_memory_store_is_always_healthy() {
        let svc = setup();
        assert!(svc.health.check().await.is_ok());
    }
}
