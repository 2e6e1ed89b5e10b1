//! Allocation domain events.

use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};

use super::OrderLine;

/// Events recorded by the product aggregate.
///
/// Events state facts that already happened; handlers react to them
/// after the scope that produced them has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// An order line was allocated to a batch.
    Allocated(AllocatedData),

    /// An order line lost its batch and needs to be allocated again.
    Deallocated(DeallocatedData),

    /// No batch could take an order line.
    OutOfStock(OutOfStockData),
}

/// Discriminant of an [`Event`], used as the handler-registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Allocated,
    Deallocated,
    OutOfStock,
}

impl Event {
    /// Returns the event name used in logs and serialized form.
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Allocated(_) => "Allocated",
            Event::Deallocated(_) => "Deallocated",
            Event::OutOfStock(_) => "OutOfStock",
        }
    }

    /// Returns the discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Allocated(_) => EventKind::Allocated,
            Event::Deallocated(_) => EventKind::Deallocated,
            Event::OutOfStock(_) => EventKind::OutOfStock,
        }
    }
}

/// Data for the Allocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedData {
    /// The customer order the line belongs to.
    pub order_id: OrderId,

    /// The sku that was allocated.
    pub sku: Sku,

    /// Quantity allocated.
    pub quantity: u32,

    /// The batch the line was allocated to.
    pub batch_reference: BatchRef,
}

/// Data for the Deallocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeallocatedData {
    /// The customer order the line belongs to.
    pub order_id: OrderId,

    /// The sku that lost its allocation.
    pub sku: Sku,

    /// Quantity that needs re-allocating.
    pub quantity: u32,
}

/// Data for the OutOfStock event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfStockData {
    /// The sku with no remaining capacity.
    pub sku: Sku,
}

// Convenience constructors for events
impl Event {
    /// Creates an Allocated event for a line placed into a batch.
    pub fn allocated(line: &OrderLine, batch_reference: BatchRef) -> Self {
        Event::Allocated(AllocatedData {
            order_id: line.order_id.clone(),
            sku: line.sku.clone(),
            quantity: line.quantity,
            batch_reference,
        })
    }

    /// Creates a Deallocated event for a line removed from its batch.
    pub fn deallocated(line: &OrderLine) -> Self {
        Event::Deallocated(DeallocatedData {
            order_id: line.order_id.clone(),
            sku: line.sku.clone(),
            quantity: line.quantity,
        })
    }

    /// Creates an OutOfStock event.
    pub fn out_of_stock(sku: Sku) -> Self {
        Event::OutOfStock(OutOfStockData { sku })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let line = OrderLine::new("order-1", "RED-CHAIR", 10);

        let event = Event::allocated(&line, BatchRef::new("batch-001"));
        assert_eq!(event.event_type(), "Allocated");
        assert_eq!(event.kind(), EventKind::Allocated);

        let event = Event::deallocated(&line);
        assert_eq!(event.event_type(), "Deallocated");
        assert_eq!(event.kind(), EventKind::Deallocated);

        let event = Event::out_of_stock(Sku::new("RED-CHAIR"));
        assert_eq!(event.event_type(), "OutOfStock");
        assert_eq!(event.kind(), EventKind::OutOfStock);
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = Event::out_of_stock(Sku::new("RED-CHAIR"));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "OutOfStock");
        assert_eq!(json["data"]["sku"], "RED-CHAIR");
    }

    #[test]
    fn test_allocated_event_carries_line_and_batch() {
        let line = OrderLine::new("order-1", "RED-CHAIR", 10);
        let event = Event::allocated(&line, BatchRef::new("batch-001"));

        match event {
            Event::Allocated(data) => {
                assert_eq!(data.order_id, OrderId::new("order-1"));
                assert_eq!(data.sku, Sku::new("RED-CHAIR"));
                assert_eq!(data.quantity, 10);
                assert_eq!(data.batch_reference, BatchRef::new("batch-001"));
            }
            other => panic!("expected Allocated, got {other:?}"),
        }
    }
}
