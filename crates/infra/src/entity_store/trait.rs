use async_trait::async_trait;
use thiserror::Error;

use subhub_core::{ProductId, SubscriptionId, UserId};
use subhub_products::Product;
use subhub_subscriptions::Subscription;
use subhub_users::User;

/// Which uniqueness constraint a write collided with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UniqueField {
    ProductId,
    ProductName,
    UserId,
    UserEmail,
    SubscriptionId,
}

impl core::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            UniqueField::ProductId => "product.id",
            UniqueField::ProductName => "product.name",
            UniqueField::UserId => "user.id",
            UniqueField::UserEmail => "user.email",
            UniqueField::SubscriptionId => "subscription.id",
        })
    }
}

/// Which reference a write left dangling.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ForeignKey {
    SubscriptionProduct,
    SubscriptionUser,
}

impl core::fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ForeignKey::SubscriptionProduct => "subscription.product_id",
            ForeignKey::SubscriptionUser => "subscription.user_id",
        })
    }
}

/// Entity store operation error.
///
/// Constraint violations are reported structurally so callers can map them to
/// domain reasons without inspecting backend messages. Everything else is a
/// fault that callers are not expected to handle.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(UniqueField),

    #[error("foreign key violated: {0}")]
    ForeignKeyViolation(ForeignKey),

    /// Stored data could not be turned back into a domain value.
    #[error("inconsistent stored data: {0}")]
    Inconsistent(String),

    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for products, users and subscriptions.
///
/// All access goes through a [`StoreTx`]; checks and the write that depends on
/// them share one transaction.
#[async_trait]
pub trait EntityStore: Send + Sync {
    type Tx: StoreTx;

    /// Start a transaction. Dropping it without [`StoreTx::commit`] rolls back.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One transactional unit of work against the entity store.
///
/// `update_*` and `delete_*` return `None` when the row does not exist.
/// Inserts and updates report constraint violations as
/// [`StoreError::UniqueViolation`] / [`StoreError::ForeignKeyViolation`].
#[async_trait]
pub trait StoreTx: Send + 'static {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Like `get_product`, but keeps concurrent writers off the row until the
    /// transaction ends.
    async fn get_product_for_update(
        &mut self,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError>;

    async fn find_product_by_name(&mut self, name: &str) -> Result<Option<Product>, StoreError>;

    async fn list_products(&mut self) -> Result<Vec<Product>, StoreError>;

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError>;

    async fn update_product(&mut self, product: &Product) -> Result<Option<Product>, StoreError>;

    async fn delete_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn get_user(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&mut self) -> Result<Vec<User>, StoreError>;

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError>;

    async fn update_user(&mut self, user: &User) -> Result<Option<User>, StoreError>;

    /// Deletes the user together with all of its subscriptions.
    async fn delete_user(&mut self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn get_subscription(
        &mut self,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, StoreError>;

    async fn list_subscriptions(&mut self) -> Result<Vec<Subscription>, StoreError>;

    async fn list_subscriptions_for_user(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<Subscription>, StoreError>;

    async fn insert_subscription(&mut self, subscription: &Subscription) -> Result<(), StoreError>;

    async fn update_subscription(
        &mut self,
        subscription: &Subscription,
    ) -> Result<Option<Subscription>, StoreError>;

    async fn delete_subscription(
        &mut self,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}
