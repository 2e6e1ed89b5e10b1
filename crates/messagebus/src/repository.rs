//! Identity-map repository over a store session.

use common::{BatchRef, Sku};
use domain::Product;
use product_store::{ProductWrite, StoreSession};

use crate::Result;

/// Where a tracked product came from, which decides how it is written back.
enum Provenance {
    /// Created in this scope; must not exist in the store at commit time.
    Added,
    /// Loaded from the store at this version.
    Loaded { version: u64 },
}

struct TrackedProduct {
    product: Product,
    provenance: Provenance,
}

/// Tracks every product touched inside one unit-of-work scope.
///
/// The repository is an identity map: the first lookup for a sku pulls
/// the aggregate out of the session, and every later lookup returns the
/// same in-scope instance, so all mutations in a scope land on one copy.
/// Products are tracked in first-visit order, which fixes the order
/// their recorded events are collected in.
pub struct ProductRepository<T> {
    session: T,
    tracked: Vec<TrackedProduct>,
}

impl<T: StoreSession> ProductRepository<T> {
    pub(crate) fn new(session: T) -> Self {
        Self {
            session,
            tracked: Vec::new(),
        }
    }

    /// Records a product created in this scope. The commit will insert
    /// it and fail if the sku already exists in the store.
    pub fn add(&mut self, product: Product) {
        match self.position(product.sku()) {
            Some(idx) => self.tracked[idx].product = product,
            None => self.tracked.push(TrackedProduct {
                product,
                provenance: Provenance::Added,
            }),
        }
    }

    /// Returns the product for a sku, loading it on first access.
    pub async fn get(&mut self, sku: &Sku) -> Result<Option<&mut Product>> {
        if self.position(sku).is_none()
            && let Some(product) = self.session.get_by_sku(sku).await?
        {
            let version = product.version_number();
            self.tracked.push(TrackedProduct {
                product,
                provenance: Provenance::Loaded { version },
            });
        }
        match self.position(sku) {
            Some(idx) => Ok(Some(&mut self.tracked[idx].product)),
            None => Ok(None),
        }
    }

    /// Returns the product owning a batch reference, loading it on
    /// first access. In-scope copies are authoritative: if the owning
    /// sku is already tracked, the tracked copy decides whether the
    /// batch exists.
    pub async fn get_by_batch_reference(
        &mut self,
        reference: &BatchRef,
    ) -> Result<Option<&mut Product>> {
        if let Some(idx) = self
            .tracked
            .iter()
            .position(|t| t.product.get_batch(reference).is_some())
        {
            return Ok(Some(&mut self.tracked[idx].product));
        }
        if let Some(product) = self.session.get_by_batch_reference(reference).await?
            && self.position(product.sku()).is_none()
        {
            let version = product.version_number();
            self.tracked.push(TrackedProduct {
                product,
                provenance: Provenance::Loaded { version },
            });
            let idx = self.tracked.len() - 1;
            return Ok(Some(&mut self.tracked[idx].product));
        }
        Ok(None)
    }

    /// Every product seen by this scope, in first-visit order.
    pub fn seen(&self) -> impl Iterator<Item = &Product> {
        self.tracked.iter().map(|t| &t.product)
    }

    /// Builds the write set for a commit. Each tracked product is
    /// cloned with its event outbox stripped: recorded events belong to
    /// the scope, never to the store.
    pub(crate) fn writes(&self) -> Vec<ProductWrite> {
        self.tracked
            .iter()
            .map(|t| {
                let mut product = t.product.clone();
                let _ = product.drain_events();
                match t.provenance {
                    Provenance::Added => ProductWrite::insert(product),
                    Provenance::Loaded { version } => ProductWrite::update(product, version),
                }
            })
            .collect()
    }

    pub(crate) fn tracked_mut(&mut self) -> impl Iterator<Item = &mut Product> {
        self.tracked.iter_mut().map(|t| &mut t.product)
    }

    pub(crate) fn session_mut(&mut self) -> &mut T {
        &mut self.session
    }

    fn position(&self, sku: &Sku) -> Option<usize> {
        self.tracked.iter().position(|t| t.product.sku() == sku)
    }
}
