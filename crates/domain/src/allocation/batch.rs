//! Stock batch entity.

use std::cmp::Ordering;

use chrono::NaiveDate;
use common::{BatchRef, Sku};
use serde::{Deserialize, Serialize};

use super::OrderLine;

/// A batch of stock: a purchased quantity of one sku, either already in
/// the warehouse (no eta) or on its way (eta set).
///
/// A batch has identity (its reference) and mutable state: the purchased
/// quantity can be revised after the fact, and order lines are allocated
/// to it over time. Allocations behave as an insertion-ordered set of
/// order lines; the same line is never held twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Reference assigned by purchasing.
    reference: BatchRef,

    /// The sku this batch holds.
    sku: Sku,

    /// Quantity purchased. Revisable via `set_purchased_quantity`.
    purchased_quantity: i64,

    /// Estimated arrival date; `None` means warehouse stock.
    eta: Option<NaiveDate>,

    /// Order lines allocated to this batch, in allocation order.
    allocations: Vec<OrderLine>,
}

// Query methods
impl Batch {
    /// Creates a new batch with no allocations.
    pub fn new(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        quantity: i64,
        eta: Option<NaiveDate>,
    ) -> Self {
        Self {
            reference: reference.into(),
            sku: sku.into(),
            purchased_quantity: quantity,
            eta,
            allocations: Vec::new(),
        }
    }

    /// Returns the batch reference.
    pub fn reference(&self) -> &BatchRef {
        &self.reference
    }

    /// Returns the sku this batch holds.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the estimated arrival date, if any.
    pub fn eta(&self) -> Option<NaiveDate> {
        self.eta
    }

    /// Returns the purchased quantity.
    pub fn purchased_quantity(&self) -> i64 {
        self.purchased_quantity
    }

    /// Returns the total quantity of all allocated lines.
    pub fn allocated_quantity(&self) -> i64 {
        self.allocations
            .iter()
            .map(|line| i64::from(line.quantity))
            .sum()
    }

    /// Returns the quantity still available for allocation.
    ///
    /// Negative while a purchased-quantity reduction has left the batch
    /// over-allocated; `Product::change_batch_quantity` deallocates lines
    /// until this is non-negative again.
    pub fn available_quantity(&self) -> i64 {
        self.purchased_quantity - self.allocated_quantity()
    }

    /// Returns the allocated lines in allocation order.
    pub fn allocations(&self) -> impl Iterator<Item = &OrderLine> {
        self.allocations.iter()
    }

    /// Returns true if the line is currently allocated to this batch.
    pub fn has_allocation(&self, line: &OrderLine) -> bool {
        self.allocations.contains(line)
    }

    /// Returns true if the line could be allocated to this batch.
    pub fn can_allocate(&self, line: &OrderLine) -> bool {
        self.sku == line.sku && self.available_quantity() >= i64::from(line.quantity)
    }

    /// Ordering used to choose a batch during allocation: warehouse stock
    /// (no eta) before shipments, earlier shipments before later ones,
    /// with the reference as a tie-break so the order is total.
    ///
    /// `Option`'s derived ordering (`None < Some`) gives warehouse stock
    /// first without a special case.
    pub fn preference_order(&self, other: &Batch) -> Ordering {
        self.eta
            .cmp(&other.eta)
            .then_with(|| self.reference.cmp(&other.reference))
    }
}

// Command methods
impl Batch {
    /// Allocates a line to this batch.
    ///
    /// No-op when the line is already allocated (idempotent) or when the
    /// batch cannot take it.
    pub fn allocate(&mut self, line: OrderLine) {
        if self.has_allocation(&line) {
            return;
        }
        if self.can_allocate(&line) {
            self.allocations.push(line);
        }
    }

    /// Removes a line from this batch. No-op when the line is not
    /// allocated here.
    pub fn deallocate(&mut self, line: &OrderLine) {
        self.allocations.retain(|allocated| allocated != line);
    }

    /// Removes and returns the earliest-allocated line, or `None` when
    /// the batch has no allocations.
    pub fn deallocate_one(&mut self) -> Option<OrderLine> {
        if self.allocations.is_empty() {
            None
        } else {
            Some(self.allocations.remove(0))
        }
    }

    /// Revises the purchased quantity. May leave `available_quantity`
    /// negative; the aggregate settles that by deallocating.
    pub(crate) fn set_purchased_quantity(&mut self, quantity: i64) {
        self.purchased_quantity = quantity;
    }
}
