//! Product aggregate implementation.

use common::{BatchRef, Sku};
use serde::{Deserialize, Serialize};

use super::{Batch, Event, OrderLine, ProductError};

/// Product aggregate root.
///
/// A product owns every batch of one sku and is the consistency boundary
/// for allocation: all decisions about where a line goes are taken here,
/// one product at a time. Events recorded during a mutation stay in the
/// aggregate's outbox until drained by the unit of work; the outbox is
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// The sku this product aggregates batches for.
    sku: Sku,

    /// Batches holding stock of this sku, in registration order.
    batches: Vec<Batch>,

    /// Version counter for optimistic concurrency, bumped by every
    /// mutating call so concurrent writers are detected at commit.
    #[serde(default)]
    version_number: u64,

    /// Events recorded since the last drain. Scope-local.
    #[serde(skip)]
    events: Vec<Event>,
}

// Query methods
impl Product {
    /// Creates a product from existing batches.
    ///
    /// Callers hand over batches of the product's own sku; batches added
    /// later go through [`Product::add_batch`], which enforces that.
    pub fn new(sku: impl Into<Sku>, batches: Vec<Batch>) -> Self {
        Self {
            sku: sku.into(),
            batches,
            version_number: 0,
            events: Vec::new(),
        }
    }

    /// Returns the product's sku.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the current version counter.
    pub fn version_number(&self) -> u64 {
        self.version_number
    }

    /// Overrides the version counter. Store implementations that keep
    /// the version outside the serialized product use this on load.
    pub fn set_version_number(&mut self, version: u64) {
        self.version_number = version;
    }

    /// Returns the batches in registration order.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Returns a batch by reference.
    pub fn get_batch(&self, reference: &BatchRef) -> Option<&Batch> {
        self.batches.iter().find(|b| b.reference() == reference)
    }

    /// Returns the number of batches.
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Returns the events recorded since the last drain.
    pub fn pending_events(&self) -> &[Event] {
        &self.events
    }
}

// Command methods
impl Product {
    /// Adds a batch of this product's sku.
    pub fn add_batch(&mut self, batch: Batch) -> Result<(), ProductError> {
        if batch.sku() != &self.sku {
            return Err(ProductError::SkuMismatch {
                product_sku: self.sku.clone(),
                batch_sku: batch.sku().clone(),
            });
        }

        self.version_number += 1;
        self.batches.push(batch);
        Ok(())
    }

    /// Allocates an order line to the most preferable batch that can
    /// take it: warehouse stock first, then the earliest shipment.
    ///
    /// Returns the chosen batch's reference, or `None` when no batch has
    /// capacity — in which case an [`Event::OutOfStock`] is recorded.
    /// Running out of stock is a domain outcome, not an error.
    ///
    /// The version counter is bumped on every call, successful or not,
    /// so even a failed attempt serializes against concurrent writers.
    pub fn allocate(&mut self, line: OrderLine) -> Option<BatchRef> {
        self.version_number += 1;

        let candidate = self
            .batches
            .iter_mut()
            .filter(|batch| batch.can_allocate(&line))
            .min_by(|a, b| a.preference_order(b));

        match candidate {
            Some(batch) => {
                let reference = batch.reference().clone();
                let event = Event::allocated(&line, reference.clone());
                batch.allocate(line);
                self.events.push(event);
                Some(reference)
            }
            None => {
                self.events.push(Event::out_of_stock(line.sku));
                None
            }
        }
    }

    /// Revises a batch's purchased quantity, deallocating lines
    /// (earliest allocation first) until the batch is no longer
    /// over-committed. One [`Event::Deallocated`] is recorded per
    /// removed line; re-allocating them is the bus's job, not ours.
    pub fn change_batch_quantity(
        &mut self,
        reference: &BatchRef,
        quantity: i64,
    ) -> Result<(), ProductError> {
        let idx = self
            .batches
            .iter()
            .position(|batch| batch.reference() == reference)
            .ok_or_else(|| ProductError::BatchNotFound {
                reference: reference.clone(),
            })?;

        self.version_number += 1;
        let batch = &mut self.batches[idx];
        batch.set_purchased_quantity(quantity);

        while batch.available_quantity() < 0 {
            match batch.deallocate_one() {
                Some(line) => self.events.push(Event::deallocated(&line)),
                None => break,
            }
        }

        Ok(())
    }

    /// Returns and clears the recorded events, preserving record order.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
