//! Bounded Asynchronous Task Queue
//!
//! Decouples producers from slow operations (codec training) with a
//! bounded buffer that never blocks the producer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        TaskQueue                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  submit() ──> ┌────┬────┬────┬────┐ ──> consumer loop        │
//! │               │ t5 │ t4 │ t3 │ t2 │      (one task at a time)│
//! │  full? drop   └────┴────┴────┴────┘            │             │
//! │  oldest (t1)                                   ↓             │
//! │                                   tokio::spawn(task).await   │
//! │                                   Completed / Failed /       │
//! │                                   Panicked -> TaskHandle     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failing or panicking operation is logged and counted; the consumer
//! moves on to the next task.

mod error;
mod queue;

pub use error::{QueueError, Result};
pub use queue::{
    ConsumerHandle, QueueConfig, QueueStats, TaskError, TaskFuture, TaskHandle, TaskId,
    TaskOutcome, TaskQueue,
};

/// Prelude for common imports
pub mod prelude {
    pub use super::{QueueConfig, QueueError, TaskHandle, TaskId, TaskOutcome, TaskQueue};
}
