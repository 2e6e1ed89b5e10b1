//! Orchestration layer for the allocation service.
//!
//! Messages travel through a FIFO [`MessageBus`]: each command or event
//! handler runs inside its own [`UnitOfWork`] scope over the product
//! store, and any events the aggregates recorded are drained back into
//! the queue when the scope closes. Commands have exactly one handler
//! and fail the run; events fan out to registered handlers whose
//! failures are logged and contained.

pub mod bus;
pub mod error;
pub mod handlers;
pub mod notifications;
pub mod publish;
pub mod repository;
pub mod unit_of_work;

pub use bus::{EventHandler, MessageBus};
pub use error::{HandlerError, Result};
pub use handlers::{AllocatedPublisher, OutOfStockNotifier, Reallocator};
pub use notifications::{InMemoryNotifications, NotificationService};
pub use publish::{EventPublisher, InMemoryPublisher};
pub use repository::ProductRepository;
pub use unit_of_work::UnitOfWork;
