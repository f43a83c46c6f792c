//! Product lifecycle rules.
//!
//! Pure decision tables over [`ProductStatus`]. Nothing here touches storage;
//! callers load the current product, build the proposed replacement and ask
//! whether the change is allowed.
//!
//! Status moves (rows = before, columns = after):
//!
//! ```text
//!              draft   published   deprecated
//! draft         ok        ok          ok
//! published     --        ok          ok
//! deprecated    --        --          ok
//! ```
//!
//! Once a product leaves `draft`, only its status may change, and only draft
//! products may be deleted.

use thiserror::Error;

use crate::product::{Product, ProductStatus};

/// Why a product mutation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleViolation {
    /// Deletion attempted outside of `draft`.
    #[error("Product status is {0}")]
    NotDeletable(ProductStatus),

    #[error("Cannot change status from {from} to {to}")]
    ForbiddenTransition {
        from: ProductStatus,
        to: ProductStatus,
    },

    /// Non-status attributes changed on a product that left `draft`.
    #[error("Cannot modify non-status attributes of a {0} product")]
    FrozenAttributes(ProductStatus),
}

/// A stored product paired with its proposed replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpdate {
    before: Product,
    after: Product,
}

impl ProductUpdate {
    pub fn new(before: Product, after: Product) -> Self {
        Self { before, after }
    }

    pub fn before(&self) -> &Product {
        &self.before
    }

    pub fn after(&self) -> &Product {
        &self.after
    }

    pub fn into_after(self) -> Product {
        self.after
    }

    /// True when nothing but the status differs.
    pub fn payload_is_identical(&self) -> bool {
        self.before.same_payload_as(&self.after)
    }
}

impl ProductStatus {
    pub fn can_transition_to(self, to: ProductStatus) -> bool {
        check_status_transition(self, to).is_ok()
    }
}

pub fn check_deletion(product: &Product) -> Result<(), LifecycleViolation> {
    match product.status() {
        ProductStatus::Draft => Ok(()),
        status @ (ProductStatus::Published | ProductStatus::Deprecated) => {
            Err(LifecycleViolation::NotDeletable(status))
        }
    }
}

pub fn check_status_transition(
    from: ProductStatus,
    to: ProductStatus,
) -> Result<(), LifecycleViolation> {
    use ProductStatus::{Deprecated, Draft, Published};

    match (from, to) {
        (Draft, _) | (Published, Published | Deprecated) | (Deprecated, Deprecated) => Ok(()),
        (Published, Draft) | (Deprecated, Draft | Published) => {
            Err(LifecycleViolation::ForbiddenTransition { from, to })
        }
    }
}

pub fn check_payload_update(update: &ProductUpdate) -> Result<(), LifecycleViolation> {
    match (update.payload_is_identical(), update.before().status()) {
        (true, _) | (false, ProductStatus::Draft) => Ok(()),
        (false, status @ (ProductStatus::Published | ProductStatus::Deprecated)) => {
            Err(LifecycleViolation::FrozenAttributes(status))
        }
    }
}

/// Full update check: status transition first, then payload immutability.
///
/// Both checks are independent; the order only fixes which reason is reported
/// when both would fail.
pub fn check_update(update: &ProductUpdate) -> Result<(), LifecycleViolation> {
    check_status_transition(update.before().status(), update.after().status())?;
    check_payload_update(update)
}
