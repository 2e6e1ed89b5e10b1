//! Outbound notifications.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::{HandlerError, Result};

/// Sends human-facing notifications. Production wires this to mail;
/// tests use [`InMemoryNotifications`].
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Sends one message to one destination.
    async fn send(&self, destination: &str, message: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<(String, String)>,
    fail_on_send: bool,
}

/// In-memory notification service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifications {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail send calls.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns every (destination, message) pair sent so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns how many notifications were sent.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Clears recorded notifications.
    pub fn clear(&self) {
        self.state.write().unwrap().sent.clear();
    }
}

#[async_trait]
impl NotificationService for InMemoryNotifications {
    async fn send(&self, destination: &str, message: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_send {
            return Err(HandlerError::Notification(
                "notification service unavailable".to_string(),
            ));
        }
        state.sent.push((destination.to_string(), message.to_string()));
        Ok(())
    }
}
