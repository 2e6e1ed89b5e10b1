//! Unit of work: one atomic scope over the product store.

use domain::Event;
use product_store::{ProductStore, StoreError, StoreSession};

use crate::repository::ProductRepository;
use crate::{HandlerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeState {
    Active,
    Committed,
    RolledBack,
}

/// One transactional scope over the product store.
///
/// A scope begins with a fresh session, accumulates work through its
/// [`ProductRepository`], and ends exactly once: through [`commit`],
/// [`rollback`], or the [`close`] safety net. Nothing reaches the store
/// unless commit is called.
///
/// [`commit`]: UnitOfWork::commit
/// [`rollback`]: UnitOfWork::rollback
/// [`close`]: UnitOfWork::close
pub struct UnitOfWork<S: ProductStore> {
    /// Products touched in this scope.
    pub products: ProductRepository<S::Session>,
    state: ScopeState,
}

impl<S: ProductStore> UnitOfWork<S> {
    /// Opens a scope over a fresh store session.
    pub async fn begin(store: &S) -> Result<Self> {
        let session = store.begin().await?;
        Ok(Self {
            products: ProductRepository::new(session),
            state: ScopeState::Active,
        })
    }

    /// Writes every tracked product back to the store atomically,
    /// checking the version each product was loaded at.
    pub async fn commit(&mut self) -> Result<()> {
        self.ensure_active()?;
        let writes = self.products.writes();
        match self.products.session_mut().commit(writes).await {
            Ok(()) => {
                self.state = ScopeState::Committed;
                Ok(())
            }
            Err(e) => {
                // A failed commit consumes the session, so the scope is
                // over either way.
                self.state = ScopeState::RolledBack;
                Err(e.into())
            }
        }
    }

    /// Discards the scope without writing anything.
    pub async fn rollback(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.products.session_mut().rollback().await?;
        self.state = ScopeState::RolledBack;
        Ok(())
    }

    /// Rolls back unless the scope already ended. Every scope ends
    /// through here, so a handler that forgets to commit discards its
    /// writes instead of leaking them.
    pub async fn close(&mut self) -> Result<()> {
        if self.state == ScopeState::Active {
            self.rollback().await
        } else {
            Ok(())
        }
    }

    /// Whether this scope committed.
    pub fn committed(&self) -> bool {
        self.state == ScopeState::Committed
    }

    /// Drains recorded events from every product this scope has seen,
    /// in first-visit order. Valid after the scope ends: rolled-back
    /// scopes still surface events such as out-of-stock.
    pub fn collect_new_events(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.products.tracked_mut().flat_map(|p| p.drain_events())
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            ScopeState::Active => Ok(()),
            _ => Err(HandlerError::Store(StoreError::SessionClosed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Sku;
    use domain::{Batch, OrderLine, Product};
    use product_store::InMemoryProductStore;

    #[tokio::test]
    async fn commit_persists_added_products() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();

        let mut product = Product::new("LAMP", Vec::new());
        product.add_batch(Batch::new("b1", "LAMP", 100, None)).unwrap();
        uow.products.add(product);
        uow.commit().await.unwrap();

        assert!(uow.committed());
        let stored = store.get(&Sku::new("LAMP")).await.unwrap();
        assert_eq!(stored.version_number(), 1);
        assert_eq!(stored.batch_count(), 1);
    }

    #[tokio::test]
    async fn commit_persists_mutations_to_loaded_products() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        let mut product = Product::new("LAMP", Vec::new());
        product.add_batch(Batch::new("b1", "LAMP", 100, None)).unwrap();
        uow.products.add(product);
        uow.commit().await.unwrap();

        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        let sku = Sku::new("LAMP");
        let product = uow.products.get(&sku).await.unwrap().unwrap();
        product.allocate(OrderLine::new("o1", "LAMP", 10));
        uow.commit().await.unwrap();

        let stored = store.get(&sku).await.unwrap();
        assert_eq!(stored.version_number(), 2);
        assert_eq!(
            stored.batches()[0].available_quantity(),
            90,
            "allocation should have been written back"
        );
    }

    #[tokio::test]
    async fn close_without_commit_discards_writes() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();

        uow.products.add(Product::new("LAMP", Vec::new()));
        uow.close().await.unwrap();

        assert!(!uow.committed());
        assert_eq!(store.product_count().await, 0);
        assert_eq!(store.rollback_count().await, 1);
    }

    #[tokio::test]
    async fn close_after_commit_is_a_no_op() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();

        uow.products.add(Product::new("LAMP", Vec::new()));
        uow.commit().await.unwrap();
        uow.close().await.unwrap();

        assert!(uow.committed());
        assert_eq!(store.commit_count().await, 1);
        assert_eq!(store.rollback_count().await, 0);
    }

    #[tokio::test]
    async fn commit_twice_fails() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();

        uow.commit().await.unwrap();
        let err = uow.commit().await.unwrap_err();

        assert!(matches!(err, HandlerError::Store(StoreError::SessionClosed)));
    }

    #[tokio::test]
    async fn version_conflict_ends_the_scope() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        uow.products.add(Product::new("LAMP", Vec::new()));
        uow.commit().await.unwrap();

        let sku = Sku::new("LAMP");
        let mut first = UnitOfWork::begin(&store).await.unwrap();
        first.products.get(&sku).await.unwrap();
        let mut second = UnitOfWork::begin(&store).await.unwrap();
        second
            .products
            .get(&sku)
            .await
            .unwrap()
            .unwrap()
            .set_version_number(2);
        second.commit().await.unwrap();

        let err = first.commit().await.unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Store(StoreError::VersionConflict { .. })
        ));
        // The losing scope is already over; close must not rollback a
        // consumed session.
        first.close().await.unwrap();
    }

    #[tokio::test]
    async fn committed_products_do_not_carry_events() {
        let store = InMemoryProductStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();

        let mut product = Product::new("LAMP", Vec::new());
        product.add_batch(Batch::new("b1", "LAMP", 10, None)).unwrap();
        product.allocate(OrderLine::new("o1", "LAMP", 20));
        uow.products.add(product);
        uow.commit().await.unwrap();

        let stored = store.get(&Sku::new("LAMP")).await.unwrap();
        assert!(stored.pending_events().is_empty());
    }

    #[tokio::test]
    async fn collect_new_events_drains_in_visit_order() {
        let store = InMemoryProductStore::new();
        let mut setup = UnitOfWork::begin(&store).await.unwrap();
        let mut lamp = Product::new("LAMP", Vec::new());
        lamp.add_batch(Batch::new("b1", "LAMP", 10, None)).unwrap();
        let mut chair = Product::new("CHAIR", Vec::new());
        chair.add_batch(Batch::new("b2", "CHAIR", 10, None)).unwrap();
        setup.products.add(lamp);
        setup.products.add(chair);
        setup.commit().await.unwrap();

        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        uow.products
            .get(&Sku::new("LAMP"))
            .await
            .unwrap()
            .unwrap()
            .allocate(OrderLine::new("o1", "LAMP", 20));
        uow.products
            .get(&Sku::new("CHAIR"))
            .await
            .unwrap()
            .unwrap()
            .allocate(OrderLine::new("o2", "CHAIR", 20));
        uow.commit().await.unwrap();

        let events: Vec<Event> = uow.collect_new_events().collect();
        let skus: Vec<&str> = events
            .iter()
            .map(|e| match e {
                Event::OutOfStock(data) => data.sku.as_str(),
                other => panic!("expected OutOfStock, got {other:?}"),
            })
            .collect();
        assert_eq!(skus, ["LAMP", "CHAIR"]);
        assert_eq!(uow.collect_new_events().count(), 0);
    }
}
