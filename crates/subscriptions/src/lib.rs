//! Subscriptions domain module.
//!
//! A subscription links a user to a product. The only rule is eligibility:
//! the referenced product must be `published` at the moment a subscription is
//! created or updated. Later status changes of the product never invalidate an
//! existing subscription.

pub mod eligibility;
pub mod subscription;

pub use eligibility::{EligibilityViolation, check_eligibility};
pub use subscription::Subscription;
