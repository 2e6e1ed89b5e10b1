use async_trait::async_trait;
use common::{BatchRef, Sku};
use domain::Product;

use crate::Result;

/// A pending write for one product aggregate.
#[derive(Debug, Clone)]
pub struct ProductWrite {
    /// The state to store.
    pub product: Product,

    /// What the store must find for the write to be valid.
    pub expected: Expected,
}

impl ProductWrite {
    /// Write for a product created in this scope; fails if the sku
    /// already exists.
    pub fn insert(product: Product) -> Self {
        Self {
            product,
            expected: Expected::Absent,
        }
    }

    /// Write for a product loaded in this scope; fails unless the stored
    /// version still matches the version seen at load time.
    pub fn update(product: Product, loaded_version: u64) -> Self {
        Self {
            product,
            expected: Expected::Version(loaded_version),
        }
    }
}

/// Optimistic-concurrency expectation attached to a [`ProductWrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// The sku must not exist yet.
    Absent,

    /// The stored version must equal this value.
    Version(u64),
}

/// Factory for transactional sessions.
///
/// One session backs one unit-of-work scope. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait ProductStore: Send + Sync {
    type Session: StoreSession;

    /// Opens a new session over the current committed state.
    async fn begin(&self) -> Result<Self::Session>;
}

/// A transactional view of the product store.
///
/// Reads see committed state only; nothing written through a session is
/// visible anywhere until [`StoreSession::commit`] succeeds. A session is
/// consumed by its first commit or rollback; any use after that fails
/// with `SessionClosed`.
#[async_trait]
pub trait StoreSession: Send {
    /// Loads the product owning a sku.
    async fn get_by_sku(&mut self, sku: &Sku) -> Result<Option<Product>>;

    /// Loads the product owning a batch reference.
    async fn get_by_batch_reference(&mut self, reference: &BatchRef) -> Result<Option<Product>>;

    /// Commits a write set atomically.
    ///
    /// Every write's expectation is validated before any write is
    /// applied; a conflict anywhere means nothing is stored.
    async fn commit(&mut self, writes: Vec<ProductWrite>) -> Result<()>;

    /// Discards the session without writing anything.
    async fn rollback(&mut self) -> Result<()>;
}
