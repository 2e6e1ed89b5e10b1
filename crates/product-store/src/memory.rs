use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BatchRef, Sku};
use domain::Product;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    Expected, Result, StoreError,
    store::{ProductStore, ProductWrite, StoreSession},
};

/// In-memory product store.
///
/// Committed products live in a shared map; sessions read from it and
/// apply their write set under the write lock. Clones share state, so a
/// test can keep a handle on the store the bus is using.
#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<HashMap<Sku, Product>>>,
    counters: Arc<RwLock<Counters>>,
}

#[derive(Default)]
struct Counters {
    commits: usize,
    rollbacks: usize,
}

impl InMemoryProductStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed products.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Returns a snapshot of a committed product.
    pub async fn get(&self, sku: &Sku) -> Option<Product> {
        self.products.read().await.get(sku).cloned()
    }

    /// Returns the number of sessions that committed successfully.
    pub async fn commit_count(&self) -> usize {
        self.counters.read().await.commits
    }

    /// Returns the number of sessions that were rolled back.
    pub async fn rollback_count(&self) -> usize {
        self.counters.read().await.rollbacks
    }

    /// Clears all committed products.
    pub async fn clear(&self) {
        self.products.write().await.clear();
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    type Session = InMemorySession;

    async fn begin(&self) -> Result<InMemorySession> {
        Ok(InMemorySession {
            products: Arc::clone(&self.products),
            counters: Arc::clone(&self.counters),
            open: true,
        })
    }
}

/// Session over the shared in-memory state.
pub struct InMemorySession {
    products: Arc<RwLock<HashMap<Sku, Product>>>,
    counters: Arc<RwLock<Counters>>,
    open: bool,
}

impl InMemorySession {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::SessionClosed)
        }
    }
}

#[async_trait]
impl StoreSession for InMemorySession {
    async fn get_by_sku(&mut self, sku: &Sku) -> Result<Option<Product>> {
        self.ensure_open()?;
        let products = self.products.read().await;
        Ok(products.get(sku).cloned())
    }

    async fn get_by_batch_reference(&mut self, reference: &BatchRef) -> Result<Option<Product>> {
        self.ensure_open()?;
        let products = self.products.read().await;
        Ok(products
            .values()
            .find(|product| product.get_batch(reference).is_some())
            .cloned())
    }

    async fn commit(&mut self, writes: Vec<ProductWrite>) -> Result<()> {
        self.ensure_open()?;
        // A failed commit consumes the session too.
        self.open = false;

        let mut products = self.products.write().await;

        // Validate the whole write set before touching anything.
        for write in &writes {
            let sku = write.product.sku();
            match (write.expected, products.get(sku)) {
                (Expected::Absent, Some(_)) => {
                    warn!(%sku, "commit rejected: product already exists");
                    return Err(StoreError::DuplicateProduct(sku.clone()));
                }
                (Expected::Version(expected), Some(stored))
                    if stored.version_number() != expected =>
                {
                    let actual = stored.version_number();
                    warn!(%sku, expected, actual, "commit rejected: version conflict");
                    return Err(StoreError::VersionConflict {
                        sku: sku.clone(),
                        expected,
                        actual,
                    });
                }
                (Expected::Version(_), None) => {
                    warn!(%sku, "commit rejected: product missing");
                    return Err(StoreError::ProductNotFound(sku.clone()));
                }
                _ => {}
            }
        }

        let count = writes.len();
        for write in writes {
            products.insert(write.product.sku().clone(), write.product);
        }
        drop(products);

        self.counters.write().await.commits += 1;
        debug!(products = count, "session committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.open = false;
        self.counters.write().await.rollbacks += 1;
        debug!("session rolled back");
        Ok(())
    }
}
