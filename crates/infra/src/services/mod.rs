//! Application services: one transaction per operation.
//!
//! Each mutating operation runs this pipeline against the entity store:
//!
//! ```text
//! request
//!   ↓
//! 1. begin transaction
//!   ↓
//! 2. load current state (existence checks)
//!   ↓
//! 3. run the pure domain rules (lifecycle / eligibility)
//!   ↓
//! 4. write, translating constraint violations into domain reasons
//!   ↓
//! 5. commit (or drop, which rolls back)
//! ```
//!
//! Rule failures surface as the service's own error variants carrying the
//! user-facing reason; store faults pass through untouched as `Store(_)`.

pub mod health;
pub mod products;
pub mod subscriptions;
pub mod users;

pub use health::HealthService;
pub use products::{ProductService, ProductServiceError};
pub use subscriptions::{SubscriptionService, SubscriptionServiceError};
pub use users::{UserService, UserServiceError};

/// Distinguishes expected rejections from store faults for logging.
pub(crate) trait ServiceFailure: std::error::Error {
    fn is_fault(&self) -> bool;
}

/// Log the outcome of a service operation and hand it back unchanged.
pub(crate) fn traced<T, E: ServiceFailure>(
    operation: &'static str,
    result: Result<T, E>,
) -> Result<T, E> {
    match &result {
        Ok(_) => tracing::info!(operation, "operation succeeded"),
        Err(err) if err.is_fault() => tracing::error!(operation, error = %err, "store fault"),
        Err(err) => tracing::debug!(operation, reason = %err, "operation rejected"),
    }
    result
}
