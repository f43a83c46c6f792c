use thiserror::Error;

use subhub_products::{Product, ProductStatus};

/// Why a product cannot be subscribed to right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EligibilityViolation {
    #[error("Product is in draft status")]
    ProductInDraft,

    #[error("Product is in deprecated status")]
    ProductDeprecated,
}

/// Decide whether `product` currently accepts subscriptions.
pub fn check_eligibility(product: &Product) -> Result<(), EligibilityViolation> {
    match product.status() {
        ProductStatus::Draft => Err(EligibilityViolation::ProductInDraft),
        ProductStatus::Published => Ok(()),
        ProductStatus::Deprecated => Err(EligibilityViolation::ProductDeprecated),
    }
}
