//! Error types for message handling.

use common::{BatchRef, Sku};
use domain::ProductError;
use product_store::StoreError;
use thiserror::Error;

/// Errors surfaced by message handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// No product exists for the requested sku.
    #[error("Invalid sku {sku}")]
    InvalidSku { sku: Sku },

    /// No product owns the requested batch reference.
    #[error("Unknown batch {reference}")]
    UnknownBatch { reference: BatchRef },

    /// A domain rule rejected the operation.
    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    /// The product store failed; version conflicts land here.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Notification delivery failed.
    #[error("Notification error: {0}")]
    Notification(String),

    /// Event publishing failed.
    #[error("Publish error: {0}")]
    Publish(String),
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, HandlerError>;
