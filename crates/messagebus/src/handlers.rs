//! Message handlers: one per command, plus event reactions.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use domain::{
    AllocateData, Batch, ChangeBatchQuantityData, Command, CreateBatchData, Event, Message,
    OrderLine, Product,
};
use product_store::ProductStore;

use crate::bus::EventHandler;
use crate::notifications::NotificationService;
use crate::publish::EventPublisher;
use crate::unit_of_work::UnitOfWork;
use crate::{HandlerError, Result};

/// Destination for out-of-stock notifications.
pub const OUT_OF_STOCK_RECIPIENT: &str = "stock@made.com";

/// Channel allocated lines are published on.
pub const ALLOCATED_CHANNEL: &str = "line_allocated";

/// Registers a new batch, creating the product aggregate on first
/// sight of a sku.
pub async fn add_batch<S: ProductStore>(
    cmd: CreateBatchData,
    uow: &mut UnitOfWork<S>,
) -> Result<()> {
    let batch = Batch::new(cmd.reference, cmd.sku.clone(), cmd.quantity, cmd.eta);
    match uow.products.get(&cmd.sku).await? {
        Some(product) => product.add_batch(batch)?,
        None => {
            let mut product = Product::new(cmd.sku, Vec::new());
            product.add_batch(batch)?;
            uow.products.add(product);
        }
    }
    uow.commit().await
}

/// Allocates an order line against the sku's batches.
///
/// Commits whether or not a batch had capacity: out of stock is a valid
/// outcome whose event must survive the scope, and the version bump has
/// to reach the store either way so concurrent allocations against the
/// same product still contend.
pub async fn allocate<S: ProductStore>(cmd: AllocateData, uow: &mut UnitOfWork<S>) -> Result<()> {
    let line = OrderLine::new(cmd.order_id, cmd.sku, cmd.quantity);
    let product = uow
        .products
        .get(&line.sku)
        .await?
        .ok_or_else(|| HandlerError::InvalidSku {
            sku: line.sku.clone(),
        })?;
    match product.allocate(line) {
        Some(batch_reference) => debug!(%batch_reference, "order line allocated"),
        None => debug!("no batch had capacity for the order line"),
    }
    uow.commit().await
}

/// Revises the purchased quantity of an existing batch. Lines that no
/// longer fit are deallocated by the aggregate, which records the
/// Deallocated events that drive re-allocation.
pub async fn change_batch_quantity<S: ProductStore>(
    cmd: ChangeBatchQuantityData,
    uow: &mut UnitOfWork<S>,
) -> Result<()> {
    let product = uow
        .products
        .get_by_batch_reference(&cmd.reference)
        .await?
        .ok_or_else(|| HandlerError::UnknownBatch {
            reference: cmd.reference.clone(),
        })?;
    product.change_batch_quantity(&cmd.reference, cmd.quantity)?;
    uow.commit().await
}

/// Notifies purchasing when a sku runs out of stock.
pub struct OutOfStockNotifier {
    notifications: Arc<dyn NotificationService>,
}

impl OutOfStockNotifier {
    pub fn new(notifications: Arc<dyn NotificationService>) -> Self {
        Self { notifications }
    }
}

#[async_trait]
impl<S: ProductStore> EventHandler<S> for OutOfStockNotifier {
    fn name(&self) -> &'static str {
        "OutOfStockNotifier"
    }

    async fn handle(&self, event: &Event, _uow: &mut UnitOfWork<S>) -> Result<Vec<Message>> {
        if let Event::OutOfStock(data) = event {
            self.notifications
                .send(
                    OUT_OF_STOCK_RECIPIENT,
                    &format!("Out of stock for {}", data.sku),
                )
                .await?;
        }
        Ok(Vec::new())
    }
}

/// Publishes allocated lines for external consumers.
pub struct AllocatedPublisher {
    publisher: Arc<dyn EventPublisher>,
}

impl AllocatedPublisher {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl<S: ProductStore> EventHandler<S> for AllocatedPublisher {
    fn name(&self) -> &'static str {
        "AllocatedPublisher"
    }

    async fn handle(&self, event: &Event, _uow: &mut UnitOfWork<S>) -> Result<Vec<Message>> {
        if let Event::Allocated(_) = event {
            self.publisher.publish(ALLOCATED_CHANNEL, event).await?;
        }
        Ok(Vec::new())
    }
}

/// Turns a deallocated line back into an Allocate command so the line
/// finds a new batch on a later pass through the queue.
pub struct Reallocator;

#[async_trait]
impl<S: ProductStore> EventHandler<S> for Reallocator {
    fn name(&self) -> &'static str {
        "Reallocator"
    }

    async fn handle(&self, event: &Event, _uow: &mut UnitOfWork<S>) -> Result<Vec<Message>> {
        match event {
            Event::Deallocated(data) => Ok(vec![
                Command::allocate(data.order_id.clone(), data.sku.clone(), data.quantity).into(),
            ]),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::InMemoryNotifications;
    use common::{BatchRef, Sku};
    use product_store::InMemoryProductStore;

    fn create_batch(reference: &str, sku: &str, quantity: i64) -> CreateBatchData {
        CreateBatchData {
            reference: BatchRef::new(reference),
            sku: Sku::new(sku),
            quantity,
            eta: None,
        }
    }

    fn allocate_line(order_id: &str, sku: &str, quantity: u32) -> AllocateData {
        AllocateData {
            order_id: order_id.into(),
            sku: Sku::new(sku),
            quantity,
        }
    }

    #[tokio::test]
    async fn add_batch_creates_product_for_new_sku() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();

        add_batch(create_batch("b1", "CRUNCHY-ARMCHAIR", 100), &mut uow)
            .await
            .unwrap();

        let product = store.get(&Sku::new("CRUNCHY-ARMCHAIR")).await.unwrap();
        assert_eq!(product.batch_count(), 1);
        assert_eq!(product.version_number(), 1);
    }

    #[tokio::test]
    async fn add_batch_extends_existing_product() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        add_batch(create_batch("b1", "GARISH-RUG", 100), &mut uow)
            .await
            .unwrap();

        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        add_batch(create_batch("b2", "GARISH-RUG", 99), &mut uow)
            .await
            .unwrap();

        let product = store.get(&Sku::new("GARISH-RUG")).await.unwrap();
        assert_eq!(product.batch_count(), 2);
        assert_eq!(product.version_number(), 2);
    }

    #[tokio::test]
    async fn allocate_reduces_batch_availability() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        add_batch(create_batch("b1", "COMPLICATED-LAMP", 100), &mut uow)
            .await
            .unwrap();

        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        allocate(allocate_line("o1", "COMPLICATED-LAMP", 10), &mut uow)
            .await
            .unwrap();

        let product = store.get(&Sku::new("COMPLICATED-LAMP")).await.unwrap();
        assert_eq!(product.batches()[0].available_quantity(), 90);
    }

    #[tokio::test]
    async fn allocate_unknown_sku_fails_without_committing() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();

        let err = allocate(allocate_line("o1", "NONEXISTENT-SKU", 10), &mut uow)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid sku NONEXISTENT-SKU");
        assert!(!uow.committed());
        assert_eq!(store.commit_count().await, 0);
    }

    #[tokio::test]
    async fn allocate_commits_even_when_out_of_stock() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        add_batch(create_batch("b1", "POPULAR-CURTAINS", 9), &mut uow)
            .await
            .unwrap();

        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        allocate(allocate_line("o1", "POPULAR-CURTAINS", 10), &mut uow)
            .await
            .unwrap();

        assert!(uow.committed());
        let events: Vec<Event> = uow.collect_new_events().collect();
        assert_eq!(events, [Event::out_of_stock(Sku::new("POPULAR-CURTAINS"))]);
        // The attempt still bumped the version.
        let product = store.get(&Sku::new("POPULAR-CURTAINS")).await.unwrap();
        assert_eq!(product.version_number(), 2);
    }

    #[tokio::test]
    async fn change_batch_quantity_revises_stock() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        add_batch(create_batch("b1", "INDIFFERENT-TABLE", 100), &mut uow)
            .await
            .unwrap();

        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        change_batch_quantity(
            ChangeBatchQuantityData {
                reference: BatchRef::new("b1"),
                quantity: 50,
            },
            &mut uow,
        )
        .await
        .unwrap();

        let product = store.get(&Sku::new("INDIFFERENT-TABLE")).await.unwrap();
        assert_eq!(product.batches()[0].available_quantity(), 50);
    }

    #[tokio::test]
    async fn change_batch_quantity_unknown_reference_fails() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();

        let err = change_batch_quantity(
            ChangeBatchQuantityData {
                reference: BatchRef::new("no-such-batch"),
                quantity: 50,
            },
            &mut uow,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, HandlerError::UnknownBatch { .. }));
        assert!(!uow.committed());
    }

    #[tokio::test]
    async fn reallocator_reissues_an_allocate_command() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        let line = OrderLine::new("o1", "VELVET-SOFA", 5);
        let event = Event::deallocated(&line);

        let followups = Reallocator.handle(&event, &mut uow).await.unwrap();

        assert_eq!(
            followups,
            [Message::Command(Command::allocate("o1", "VELVET-SOFA", 5))]
        );
    }

    #[tokio::test]
    async fn notifier_ignores_other_events() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        let notifications = InMemoryNotifications::new();
        let notifier = OutOfStockNotifier::new(Arc::new(notifications.clone()));

        let line = OrderLine::new("o1", "VELVET-SOFA", 5);
        notifier
            .handle(&Event::allocated(&line, BatchRef::new("b1")), &mut uow)
            .await
            .unwrap();

        assert_eq!(notifications.sent_count(), 0);
    }
}
