use thiserror::Error;
use tracing::instrument;

use subhub_core::{Entity, ProductId};
use subhub_products::{LifecycleViolation, Product, ProductUpdate, check_deletion, check_update};

use super::{ServiceFailure, traced};
use crate::entity_store::{EntityStore, StoreError, StoreTx, UniqueField};

#[derive(Debug, Error)]
pub enum ProductServiceError {
    #[error("Product does not exist")]
    NotFound,

    #[error("ID already exists")]
    IdExists,

    #[error("Name already exists")]
    NameExists,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleViolation),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceFailure for ProductServiceError {
    fn is_fault(&self) -> bool {
        matches!(self, ProductServiceError::Store(_))
    }
}

fn map_write_error(err: StoreError) -> ProductServiceError {
    match err {
        StoreError::UniqueViolation(UniqueField::ProductId) => ProductServiceError::IdExists,
        StoreError::UniqueViolation(UniqueField::ProductName) => ProductServiceError::NameExists,
        other => ProductServiceError::Store(other),
    }
}

/// Product catalog operations, lifecycle rules included.
#[derive(Debug, Clone)]
pub struct ProductService<S> {
    store: S,
}

impl<S: EntityStore> ProductService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, product), fields(product_id = %product.id()))]
    pub async fn create(&self, product: Product) -> Result<Product, ProductServiceError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            tx.insert_product(&product).await.map_err(map_write_error)?;
            tx.commit().await?;
            Ok::<_, ProductServiceError>(product)
        }
        .await;
        traced("products.create", result)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Product, ProductServiceError> {
        let mut tx = self.store.begin().await?;
        tx.get_product(id)
            .await?
            .ok_or(ProductServiceError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn get_by_name(&self, name: &str) -> Result<Product, ProductServiceError> {
        let mut tx = self.store.begin().await?;
        tx.find_product_by_name(name)
            .await?
            .ok_or(ProductServiceError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, ProductServiceError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_products().await?)
    }

    /// Replace a product. The stored version must exist, the status move must
    /// be allowed, and non-status attributes are frozen outside `draft`.
    #[instrument(skip(self, product), fields(product_id = %product.id(), status = %product.status()))]
    pub async fn update(&self, product: Product) -> Result<Product, ProductServiceError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let before = tx
                .get_product_for_update(product.id())
                .await?
                .ok_or(ProductServiceError::NotFound)?;

            let update = ProductUpdate::new(before, product);
            check_update(&update)?;

            let updated = tx
                .update_product(update.after())
                .await
                .map_err(map_write_error)?
                .ok_or(ProductServiceError::NotFound)?;
            tx.commit().await?;
            Ok::<_, ProductServiceError>(updated)
        }
        .await;
        traced("products.update", result)
    }

    /// Delete a draft product and return what was removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<Product, ProductServiceError> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let current = tx
                .get_product_for_update(id)
                .await?
                .ok_or(ProductServiceError::NotFound)?;
            check_deletion(&current)?;

            let deleted = tx
                .delete_product(id)
                .await?
                .ok_or(ProductServiceError::NotFound)?;
            tx.commit().await?;
            Ok::<_, ProductServiceError>(deleted)
        }
        .await;
        traced("products.delete", result)
    }
}
