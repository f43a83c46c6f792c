//! Products domain module.
//!
//! This crate contains the product catalog types and the lifecycle rules that
//! decide whether a product may be updated or deleted, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod lifecycle;
pub mod product;

pub use lifecycle::{
    LifecycleViolation, ProductUpdate, check_deletion, check_payload_update,
    check_status_transition, check_update,
};
pub use product::{MonthlyFee, Product, ProductStatus};
