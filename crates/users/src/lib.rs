//! Users domain module.
//!
//! Users carry no lifecycle: any attribute may change and deletion is
//! unconditional. Email uniqueness is enforced by the entity store.

pub mod user;

pub use user::{Email, User};
