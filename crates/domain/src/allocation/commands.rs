//! Allocation commands.

use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};

/// Commands accepted by the message bus.
///
/// A command names one intent and has exactly one handler; a failed
/// command is an error the caller sees, unlike an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    /// Register a new batch of stock.
    CreateBatch(CreateBatchData),

    /// Allocate an order line against the available batches.
    Allocate(AllocateData),

    /// Revise the purchased quantity of an existing batch.
    ChangeBatchQuantity(ChangeBatchQuantityData),
}

impl Command {
    /// Returns the command name used in logs and serialized form.
    pub fn command_type(&self) -> &'static str {
        match self {
            Command::CreateBatch(_) => "CreateBatch",
            Command::Allocate(_) => "Allocate",
            Command::ChangeBatchQuantity(_) => "ChangeBatchQuantity",
        }
    }
}

/// Data for the CreateBatch command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBatchData {
    /// Reference of the new batch.
    pub reference: BatchRef,

    /// The sku the batch holds.
    pub sku: Sku,

    /// Purchased quantity.
    pub quantity: i64,

    /// Estimated arrival date; `None` for warehouse stock.
    pub eta: Option<NaiveDate>,
}

/// Data for the Allocate command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocateData {
    /// The customer order the line belongs to.
    pub order_id: OrderId,

    /// The sku being ordered.
    pub sku: Sku,

    /// Quantity ordered.
    pub quantity: u32,
}

/// Data for the ChangeBatchQuantity command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatchQuantityData {
    /// Reference of the batch to revise.
    pub reference: BatchRef,

    /// The new purchased quantity.
    pub quantity: i64,
}

// Convenience constructors for commands
impl Command {
    /// Creates a CreateBatch command.
    pub fn create_batch(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        quantity: i64,
        eta: Option<NaiveDate>,
    ) -> Self {
        Command::CreateBatch(CreateBatchData {
            reference: reference.into(),
            sku: sku.into(),
            quantity,
            eta,
        })
    }

    /// Creates an Allocate command.
    pub fn allocate(order_id: impl Into<OrderId>, sku: impl Into<Sku>, quantity: u32) -> Self {
        Command::Allocate(AllocateData {
            order_id: order_id.into(),
            sku: sku.into(),
            quantity,
        })
    }

    /// Creates a ChangeBatchQuantity command.
    pub fn change_batch_quantity(reference: impl Into<BatchRef>, quantity: i64) -> Self {
        Command::ChangeBatchQuantity(ChangeBatchQuantityData {
            reference: reference.into(),
            quantity,
        })
    }
}
