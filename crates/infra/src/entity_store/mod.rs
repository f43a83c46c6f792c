//! Transactional entity store boundary.
//!
//! Services see storage only through [`EntityStore`] / [`StoreTx`]; the
//! in-memory backend serves tests and local runs, Postgres serves production.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{InMemoryEntityStore, InMemoryTx};
pub use postgres::{PostgresEntityStore, PostgresTx};
pub use r#trait::{EntityStore, ForeignKey, StoreError, StoreTx, UniqueField};
