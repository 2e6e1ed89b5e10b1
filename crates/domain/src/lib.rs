//! Domain model for the allocation service.
//!
//! This crate provides the pure in-memory model:
//! - Product aggregate that allocates order lines against stock batches
//! - Batch and OrderLine building blocks
//! - Command and Event messages consumed and produced by the model
//!
//! The model performs no I/O. Persistence lives in the product-store
//! crate and orchestration in the messagebus crate.

pub mod allocation;

pub use allocation::{
    AllocateData, AllocatedData, Batch, ChangeBatchQuantityData, Command, CreateBatchData,
    DeallocatedData, Event, EventKind, Message, OrderLine, OutOfStockData, Product, ProductError,
};
