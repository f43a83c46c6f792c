use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use subhub_core::{Entity, ProductId, SubscriptionId, UserId};
use subhub_products::Product;
use subhub_subscriptions::Subscription;
use subhub_users::User;

use super::r#trait::{EntityStore, ForeignKey, StoreError, StoreTx, UniqueField};

#[derive(Debug, Default, Clone)]
struct Tables {
    products: Vec<Product>,
    users: Vec<User>,
    subscriptions: Vec<Subscription>,
}

impl Tables {
    fn product_index(&self, id: ProductId) -> Option<usize> {
        self.products.iter().position(|p| p.id() == id)
    }

    fn user_index(&self, id: UserId) -> Option<usize> {
        self.users.iter().position(|u| u.id() == id)
    }

    fn subscription_index(&self, id: SubscriptionId) -> Option<usize> {
        self.subscriptions.iter().position(|s| s.id() == id)
    }

    fn check_references(&self, subscription: &Subscription) -> Result<(), StoreError> {
        if self.product_index(subscription.product_id()).is_none() {
            return Err(StoreError::ForeignKeyViolation(
                ForeignKey::SubscriptionProduct,
            ));
        }
        if self.user_index(subscription.user_id()).is_none() {
            return Err(StoreError::ForeignKeyViolation(ForeignKey::SubscriptionUser));
        }
        Ok(())
    }
}

/// In-memory entity store.
///
/// Intended for tests/dev. Transactions are serialized: `begin` takes the
/// store-wide lock and works on a copy, `commit` swaps the copy in. Rows are
/// kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEntityStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, StoreError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTx { guard, working })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Transaction over [`InMemoryEntityStore`]. Holds the store lock until it is
/// committed or dropped.
#[derive(Debug)]
pub struct InMemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self
            .working
            .product_index(id)
            .map(|idx| self.working.products[idx].clone()))
    }

    async fn get_product_for_update(
        &mut self,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        self.get_product(id).await
    }

    async fn find_product_by_name(&mut self, name: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .working
            .products
            .iter()
            .find(|p| p.name() == name)
            .cloned())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, StoreError> {
        Ok(self.working.products.clone())
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        if self.working.product_index(product.id()).is_some() {
            return Err(StoreError::UniqueViolation(UniqueField::ProductId));
        }
        if self.working.products.iter().any(|p| p.name() == product.name()) {
            return Err(StoreError::UniqueViolation(UniqueField::ProductName));
        }
        self.working.products.push(product.clone());
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<Option<Product>, StoreError> {
        let Some(idx) = self.working.product_index(product.id()) else {
            return Ok(None);
        };
        let name_taken = self
            .working
            .products
            .iter()
            .any(|p| p.id() != product.id() && p.name() == product.name());
        if name_taken {
            return Err(StoreError::UniqueViolation(UniqueField::ProductName));
        }
        self.working.products[idx] = product.clone();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let Some(idx) = self.working.product_index(id) else {
            return Ok(None);
        };
        if self.working.subscriptions.iter().any(|s| s.product_id() == id) {
            return Err(StoreError::ForeignKeyViolation(
                ForeignKey::SubscriptionProduct,
            ));
        }
        Ok(Some(self.working.products.remove(idx)))
    }

    async fn get_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self
            .working
            .user_index(id)
            .map(|idx| self.working.users[idx].clone()))
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .working
            .users
            .iter()
            .find(|u| u.email().as_str() == email)
            .cloned())
    }

    async fn list_users(&mut self) -> Result<Vec<User>, StoreError> {
        Ok(self.working.users.clone())
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        if self.working.user_index(user.id()).is_some() {
            return Err(StoreError::UniqueViolation(UniqueField::UserId));
        }
        if self.working.users.iter().any(|u| u.email() == user.email()) {
            return Err(StoreError::UniqueViolation(UniqueField::UserEmail));
        }
        self.working.users.push(user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> Result<Option<User>, StoreError> {
        let Some(idx) = self.working.user_index(user.id()) else {
            return Ok(None);
        };
        let email_taken = self
            .working
            .users
            .iter()
            .any(|u| u.id() != user.id() && u.email() == user.email());
        if email_taken {
            return Err(StoreError::UniqueViolation(UniqueField::UserEmail));
        }
        self.working.users[idx] = user.clone();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let Some(idx) = self.working.user_index(id) else {
            return Ok(None);
        };
        self.working.subscriptions.retain(|s| s.user_id() != id);
        Ok(Some(self.working.users.remove(idx)))
    }

    async fn get_subscription(
        &mut self,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, StoreError> {
        Ok(self
            .working
            .subscription_index(id)
            .map(|idx| self.working.subscriptions[idx]))
    }

    async fn list_subscriptions(&mut self) -> Result<Vec<Subscription>, StoreError> {
        Ok(self.working.subscriptions.clone())
    }

    async fn list_subscriptions_for_user(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<Subscription>, StoreError> {
        Ok(self
            .working
            .subscriptions
            .iter()
            .filter(|s| s.user_id() == user_id)
            .copied()
            .collect())
    }

    async fn insert_subscription(&mut self, subscription: &Subscription) -> Result<(), StoreError> {
        if self.working.subscription_index(subscription.id()).is_some() {
            return Err(StoreError::UniqueViolation(UniqueField::SubscriptionId));
        }
        self.working.check_references(subscription)?;
        self.working.subscriptions.push(*subscription);
        Ok(())
    }

    async fn update_subscription(
        &mut self,
        subscription: &Subscription,
    ) -> Result<Option<Subscription>, StoreError> {
        let Some(idx) = self.working.subscription_index(subscription.id()) else {
            return Ok(None);
        };
        self.working.check_references(subscription)?;
        self.working.subscriptions[idx] = *subscription;
        Ok(Some(*subscription))
    }

    async fn delete_subscription(
        &mut self,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, StoreError> {
        Ok(self
            .working
            .subscription_index(id)
            .map(|idx| self.working.subscriptions.remove(idx)))
    }

    async fn commit(self) -> Result<(), StoreError> {
        let InMemoryTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use subhub_products::{MonthlyFee, ProductStatus};
    use subhub_users::Email;

    fn product(name: &str) -> Product {
        Product::new(
            ProductId::new(),
            MonthlyFee::new(Decimal::new(999, 2)).unwrap(),
            name,
            ProductStatus::Published,
        )
        .unwrap()
    }

    fn user(email: &str) -> User {
        User::new(UserId::new(), Email::parse(email).unwrap())
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = InMemoryEntityStore::new();
        let p = product("Basic");

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_product(&p).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get_product(p.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_rows_are_visible_in_insertion_order() {
        let store = InMemoryEntityStore::new();
        let a = product("A");
        let b = product("B");

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&b).await.unwrap();
        tx.insert_product(&a).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let names: Vec<_> = tx
            .list_products()
            .await
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn id_collision_is_reported_before_name_collision() {
        let store = InMemoryEntityStore::new();
        let p = product("Basic");

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&p).await.unwrap();

        let err = tx.insert_product(&p).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniqueViolation(UniqueField::ProductId)
        ));

        let err = tx.insert_product(&product("Basic")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniqueViolation(UniqueField::ProductName)
        ));
    }

    #[tokio::test]
    async fn renaming_onto_another_product_is_a_name_collision() {
        let store = InMemoryEntityStore::new();
        let a = product("A");
        let b = product("B");

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&a).await.unwrap();
        tx.insert_product(&b).await.unwrap();

        let renamed = Product::new(b.id(), b.monthly_fee(), "A", b.status()).unwrap();
        let err = tx.update_product(&renamed).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniqueViolation(UniqueField::ProductName)
        ));

        // Keeping its own name is not a collision.
        assert_eq!(tx.update_product(&b).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn subscriptions_need_existing_product_and_user() {
        let store = InMemoryEntityStore::new();
        let p = product("Basic");
        let u = user("a@example.com");

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&p).await.unwrap();

        let orphan = Subscription::new(SubscriptionId::new(), true, u.id(), p.id());
        let err = tx.insert_subscription(&orphan).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ForeignKeyViolation(ForeignKey::SubscriptionUser)
        ));

        tx.insert_user(&u).await.unwrap();
        tx.insert_subscription(&orphan).await.unwrap();

        let err = tx.delete_product(p.id()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ForeignKeyViolation(ForeignKey::SubscriptionProduct)
        ));
    }

    #[tokio::test]
    async fn deleting_a_user_removes_its_subscriptions() {
        let store = InMemoryEntityStore::new();
        let p = product("Basic");
        let alice = user("alice@example.com");
        let bob = user("bob@example.com");

        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&p).await.unwrap();
        tx.insert_user(&alice).await.unwrap();
        tx.insert_user(&bob).await.unwrap();
        let s1 = Subscription::new(SubscriptionId::new(), true, alice.id(), p.id());
        let s2 = Subscription::new(SubscriptionId::new(), true, bob.id(), p.id());
        tx.insert_subscription(&s1).await.unwrap();
        tx.insert_subscription(&s2).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.delete_user(alice.id()).await.unwrap(), Some(alice.clone()));
        assert_eq!(tx.list_subscriptions().await.unwrap(), vec![s2]);
        assert!(tx.list_subscriptions_for_user(alice.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_rows_yield_none() {
        let store = InMemoryEntityStore::new();
        let mut tx = store.begin().await.unwrap();

        assert!(tx.update_product(&product("X")).await.unwrap().is_none());
        assert!(tx.delete_product(ProductId::new()).await.unwrap().is_none());
        assert!(tx.update_user(&user("x@example.com")).await.unwrap().is_none());
        assert!(tx.delete_user(UserId::new()).await.unwrap().is_none());
        assert!(
            tx.delete_subscription(SubscriptionId::new())
                .await
                .unwrap()
                .is_none()
        );
    }
}
