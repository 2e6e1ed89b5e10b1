//! Value objects for the allocation domain.

use common::{OrderId, Sku};
use serde::{Deserialize, Serialize};

/// A line of a customer order: a demand for a quantity of one sku.
///
/// Order lines are value objects. Two lines with the same order id, sku
/// and quantity are the same line, which is what makes allocation
/// idempotent at the batch level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLine {
    /// The customer order this line belongs to.
    pub order_id: OrderId,

    /// The sku being ordered.
    pub sku: Sku,

    /// Quantity ordered.
    pub quantity: u32,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(order_id: impl Into<OrderId>, sku: impl Into<Sku>, quantity: u32) -> Self {
        Self {
            order_id: order_id.into(),
            sku: sku.into(),
            quantity,
        }
    }
}
