//! Event publishing to the outside world.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Event;

use crate::{HandlerError, Result};

/// Publishes domain events on named channels for external consumers.
/// Production wires this to a broker; tests use [`InMemoryPublisher`].
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event on a channel.
    async fn publish(&self, channel: &str, event: &Event) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    published: Vec<(String, Event)>,
    fail_on_publish: bool,
}

/// In-memory event publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to fail publish calls.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_on_publish = fail;
    }

    /// Returns every (channel, event) pair published so far.
    pub fn published(&self) -> Vec<(String, Event)> {
        self.state.read().unwrap().published.clone()
    }

    /// Returns how many events were published.
    pub fn published_count(&self) -> usize {
        self.state.read().unwrap().published.len()
    }

    /// Clears recorded events.
    pub fn clear(&self) {
        self.state.write().unwrap().published.clear();
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(&self, channel: &str, event: &Event) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_publish {
            return Err(HandlerError::Publish("broker unavailable".to_string()));
        }
        state.published.push((channel.to_string(), event.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Sku;

    #[tokio::test]
    async fn records_published_events() {
        let publisher = InMemoryPublisher::new();
        let event = Event::out_of_stock(Sku::new("LAMP"));

        publisher.publish("stock", &event).await.unwrap();

        assert_eq!(publisher.published_count(), 1);
        assert_eq!(publisher.published(), [("stock".to_string(), event)]);
    }

    #[tokio::test]
    async fn fails_when_configured_to() {
        let publisher = InMemoryPublisher::new();
        publisher.set_fail_on_publish(true);

        let event = Event::out_of_stock(Sku::new("LAMP"));
        let err = publisher.publish("stock", &event).await.unwrap_err();

        assert!(matches!(err, HandlerError::Publish(_)));
        assert_eq!(publisher.published_count(), 0);
    }
}
