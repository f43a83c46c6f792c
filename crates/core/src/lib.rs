//! `subhub-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the product, user
//! and subscription modules (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ProductId, SubscriptionId, UserId};
pub use value_object::ValueObject;
