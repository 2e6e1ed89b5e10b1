//! Persistence collaborator for product aggregates.
//!
//! This crate defines the contract the unit of work talks to:
//! - [`ProductStore`] hands out transactional [`StoreSession`]s
//! - a session reads committed products and commits a write set
//!   atomically, with optimistic version checks per aggregate
//!
//! The shipped implementation is [`InMemoryProductStore`]; the traits are
//! the seam a SQL-backed store would plug into.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryProductStore;
pub use store::{Expected, ProductStore, ProductWrite, StoreSession};
