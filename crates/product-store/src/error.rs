use common::Sku;
use thiserror::Error;

/// Errors that can occur when interacting with the product store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another scope committed the same product first.
    /// The expected version did not match the stored version.
    #[error("Version conflict for {sku}: expected version {expected}, found {actual}")]
    VersionConflict {
        sku: Sku,
        expected: u64,
        actual: u64,
    },

    /// A product expected to be new already exists.
    #[error("Product already exists: {0}")]
    DuplicateProduct(Sku),

    /// A product expected to exist was not found.
    #[error("Product not found: {0}")]
    ProductNotFound(Sku),

    /// The session was already committed or rolled back.
    #[error("Session already closed")]
    SessionClosed,
}

/// Result type for product store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
