//! Message bus: routes commands and events to their handlers.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use domain::{Command, Event, EventKind, Message};
use product_store::ProductStore;

use crate::Result;
use crate::handlers::{self, AllocatedPublisher, OutOfStockNotifier, Reallocator};
use crate::notifications::NotificationService;
use crate::publish::EventPublisher;
use crate::unit_of_work::UnitOfWork;

/// Reaction to a domain event.
///
/// Returned messages are appended to the bus queue after the handler's
/// scope closes; that is how an event handler issues a command without
/// re-entering the bus.
#[async_trait]
pub trait EventHandler<S: ProductStore>: Send + Sync {
    /// Handler name used in logs.
    fn name(&self) -> &'static str;

    /// Reacts to one event inside its own scope.
    async fn handle(&self, event: &Event, uow: &mut UnitOfWork<S>) -> Result<Vec<Message>>;
}

/// Routes messages to handlers, one unit-of-work scope per handler run.
///
/// Handling is a FIFO drain: one message may put more on the queue
/// (events drained from the aggregates plus handler follow-ups), and
/// the loop runs until the queue is empty. Commands have exactly one
/// handler and their failure aborts the run; events fan out to zero or
/// more handlers whose failures are logged and contained.
pub struct MessageBus<S: ProductStore> {
    store: S,
    event_handlers: HashMap<EventKind, Vec<Box<dyn EventHandler<S>>>>,
}

impl<S: ProductStore> MessageBus<S> {
    /// Creates a bus with the default event handlers wired up.
    pub fn new(
        store: S,
        notifications: Arc<dyn NotificationService>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let mut bus = Self::without_handlers(store);
        bus.register_event_handler(
            EventKind::Allocated,
            Box::new(AllocatedPublisher::new(publisher)),
        );
        bus.register_event_handler(EventKind::Deallocated, Box::new(Reallocator));
        bus.register_event_handler(
            EventKind::OutOfStock,
            Box::new(OutOfStockNotifier::new(notifications)),
        );
        bus
    }

    /// Creates a bus with an empty event-handler registry.
    pub fn without_handlers(store: S) -> Self {
        Self {
            store,
            event_handlers: HashMap::new(),
        }
    }

    /// Appends a handler for an event kind. Handlers for the same kind
    /// run in registration order; kinds with no handlers are skipped.
    pub fn register_event_handler(&mut self, kind: EventKind, handler: Box<dyn EventHandler<S>>) {
        self.event_handlers.entry(kind).or_default().push(handler);
    }

    /// Returns the store this bus runs against.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handles one message and everything it sets in motion.
    ///
    /// The result reflects command handling only: an event handler
    /// failure never surfaces here.
    #[tracing::instrument(skip_all)]
    pub async fn handle(&self, message: impl Into<Message>) -> Result<()> {
        let start = Instant::now();
        let result = self.drain(VecDeque::from([message.into()])).await;
        metrics::histogram!("messagebus_handle_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        result
    }

    async fn drain(&self, mut queue: VecDeque<Message>) -> Result<()> {
        while let Some(message) = queue.pop_front() {
            metrics::counter!("messagebus_messages_total").increment(1);
            match message {
                Message::Command(command) => self.handle_command(command, &mut queue).await?,
                Message::Event(event) => self.handle_event(event, &mut queue).await,
            }
        }
        Ok(())
    }

    async fn handle_command(&self, command: Command, queue: &mut VecDeque<Message>) -> Result<()> {
        debug!(command = command.command_type(), "handling command");

        let mut uow = UnitOfWork::begin(&self.store).await?;
        let result = match command {
            Command::CreateBatch(data) => handlers::add_batch(data, &mut uow).await,
            Command::Allocate(data) => handlers::allocate(data, &mut uow).await,
            Command::ChangeBatchQuantity(data) => {
                handlers::change_batch_quantity(data, &mut uow).await
            }
        };

        match result {
            Ok(()) => {
                uow.close().await?;
                queue.extend(uow.collect_new_events().map(Message::from));
                Ok(())
            }
            Err(e) => {
                metrics::counter!("messagebus_command_failures_total").increment(1);
                if let Err(close_err) = uow.close().await {
                    error!(error = %close_err, "rollback after failed command also failed");
                }
                Err(e)
            }
        }
    }

    async fn handle_event(&self, event: Event, queue: &mut VecDeque<Message>) {
        debug!(event = event.event_type(), "handling event");

        let handlers = match self.event_handlers.get(&event.kind()) {
            Some(handlers) => handlers.as_slice(),
            None => &[],
        };

        for handler in handlers {
            let mut uow = match UnitOfWork::begin(&self.store).await {
                Ok(uow) => uow,
                Err(e) => {
                    metrics::counter!("messagebus_event_handler_failures_total").increment(1);
                    warn!(handler = handler.name(), error = %e, "could not open handler scope");
                    continue;
                }
            };

            match handler.handle(&event, &mut uow).await {
                Ok(followups) => {
                    if let Err(e) = uow.close().await {
                        warn!(handler = handler.name(), error = %e, "handler scope failed to close");
                    }
                    queue.extend(uow.collect_new_events().map(Message::from));
                    queue.extend(followups);
                }
                Err(e) => {
                    metrics::counter!("messagebus_event_handler_failures_total").increment(1);
                    warn!(handler = handler.name(), error = %e, "event handler failed");
                    if let Err(close_err) = uow.close().await {
                        warn!(handler = handler.name(), error = %close_err, "handler scope failed to close");
                    }
                }
            }
        }
    }
}
