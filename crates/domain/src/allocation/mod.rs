//! Product aggregate and related types.

mod aggregate;
mod batch;
mod commands;
mod events;
mod message;
mod value_objects;

pub use aggregate::Product;
pub use batch::Batch;
pub use commands::{AllocateData, ChangeBatchQuantityData, Command, CreateBatchData};
pub use events::{AllocatedData, DeallocatedData, Event, EventKind, OutOfStockData};
pub use message::Message;
pub use value_objects::OrderLine;

use common::{BatchRef, Sku};
use thiserror::Error;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// No batch with the given reference belongs to this product.
    #[error("Batch not found: {reference}")]
    BatchNotFound { reference: BatchRef },

    /// A batch for a different sku cannot be added to this product.
    #[error("Sku mismatch: product {product_sku} cannot hold a batch of {batch_sku}")]
    SkuMismatch { product_sku: Sku, batch_sku: Sku },
}
