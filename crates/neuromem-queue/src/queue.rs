//! Bounded drop-oldest task queue

use crate::{QueueError, Result};
use metrics::{counter, gauge};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch, Notify};
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

/// Error type returned by queued operations
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// A boxed queued operation
pub type TaskFuture = Pin<Box<dyn Future<Output = std::result::Result<(), TaskError>> + Send>>;

/// Queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of buffered tasks
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 12_000 }
    }
}

impl QueueConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(QueueError::InvalidConfig("capacity must be at least 1".into()));
        }
        Ok(())
    }
}

/// Identifier assigned to each submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a task ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The operation returned `Ok`
    Completed,
    /// The operation returned an error
    Failed(String),
    /// The operation panicked
    Panicked(String),
    /// The task was dropped before it ran
    Discarded,
}

impl TaskOutcome {
    /// Whether the operation ran and succeeded
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }
}

/// Completion handle for a task submitted with [`TaskQueue::submit_with_handle`]
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    rx: oneshot::Receiver<TaskOutcome>,
}

impl TaskHandle {
    /// Task identifier
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Wait for the task to finish.
    ///
    /// A task dropped without running (overflow, or the queue itself was
    /// dropped) resolves to [`TaskOutcome::Discarded`], as does a task aborted
    /// because its consumer loop was cancelled.
    pub async fn outcome(self) -> TaskOutcome {
        self.rx.await.unwrap_or(TaskOutcome::Discarded)
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStats {
    /// Tasks accepted by `submit`
    pub submitted: u64,
    /// Tasks that ran and succeeded
    pub executed: u64,
    /// Tasks that returned an error or panicked
    pub failed: u64,
    /// Tasks dropped by the capacity bound
    pub discarded: u64,
    /// Buffered tasks plus the one executing, if any
    pub pending: usize,
    /// Maximum buffered tasks
    pub capacity: usize,
}

struct QueuedTask {
    id: TaskId,
    future: TaskFuture,
    completion: Option<oneshot::Sender<TaskOutcome>>,
}

impl QueuedTask {
    fn discard(self) {
        if let Some(tx) = self.completion {
            let _ = tx.send(TaskOutcome::Discarded);
        }
    }
}

#[derive(Default)]
struct State {
    buffer: VecDeque<QueuedTask>,
    in_flight: bool,
    last_id: u64,
}

/// Bounded FIFO of asynchronous operations with one consumer.
///
/// Producers never wait: when the buffer is full the oldest buffered task
/// is dropped to make room. A single consumer loop ([`TaskQueue::run`])
/// executes tasks one at a time in submission order.
pub struct TaskQueue {
    config: QueueConfig,
    state: Mutex<State>,
    available: Notify,
    idle: Notify,
    consumer_active: AtomicBool,
    submitted: AtomicU64,
    executed: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
}

impl TaskQueue {
    /// Create a new queue
    pub fn new(config: QueueConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            state: Mutex::new(State::default()),
            available: Notify::new(),
            idle: Notify::new(),
            consumer_active: AtomicBool::new(false),
            submitted: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        })
    }

    /// Configuration
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Maximum number of buffered tasks
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Enqueue an operation. Never waits.
    pub fn submit<F, E>(&self, op: F) -> TaskId
    where
        F: Future<Output = std::result::Result<(), E>> + Send + 'static,
        E: Into<TaskError> + 'static,
    {
        self.enqueue(boxed(op), None)
    }

    /// Enqueue an operation and get a handle that resolves when it finishes
    pub fn submit_with_handle<F, E>(&self, op: F) -> (TaskId, TaskHandle)
    where
        F: Future<Output = std::result::Result<(), E>> + Send + 'static,
        E: Into<TaskError> + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let id = self.enqueue(boxed(op), Some(tx));
        (id, TaskHandle { id, rx })
    }

    fn enqueue(&self, future: TaskFuture, completion: Option<oneshot::Sender<TaskOutcome>>) -> TaskId {
        let (id, dropped, buffered) = {
            let mut state = self.state.lock();

            // Ids follow buffer order
            state.last_id += 1;
            let id = TaskId(state.last_id);
            let task = QueuedTask {
                id,
                future,
                completion,
            };

            let dropped = if state.buffer.len() >= self.config.capacity {
                state.buffer.pop_front()
            } else {
                None
            };
            state.buffer.push_back(task);
            (id, dropped, state.buffer.len())
        };

        self.submitted.fetch_add(1, Ordering::Relaxed);
        gauge!("neuromem_queue_buffered").set(buffered as f64);

        if let Some(old) = dropped {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            counter!("neuromem_tasks_discarded_total").increment(1);
            warn!("Queue full ({}), discarded task {}", self.config.capacity, old.id);
            old.discard();
        }

        debug!("Submitted task {} ({} buffered)", id, buffered);
        self.available.notify_one();
        id
    }

    /// Run the consumer loop until `shutdown` turns `true` or its sender is dropped.
    ///
    /// The shutdown signal is checked between tasks; a running task is always
    /// finished first. Fails with [`QueueError::ConsumerAlreadyRunning`] if
    /// another loop owns the queue.
    ///
    /// Dropping the returned future mid-task aborts that task and frees the
    /// consumer slot; the rest of the buffer is left for the next consumer.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        self.claim_consumer()?;
        self.consume(shutdown, OnSenderDrop::Stop).await;
        Ok(())
    }

    /// Start the consumer loop on the tokio runtime.
    ///
    /// The loop stops only through [`ConsumerHandle::shutdown`]. Dropping the
    /// handle detaches the consumer, which then runs for the life of the runtime.
    pub fn spawn(self: Arc<Self>) -> Result<ConsumerHandle> {
        self.claim_consumer()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let queue = Arc::clone(&self);
        let join = tokio::spawn(async move {
            queue.consume(shutdown_rx, OnSenderDrop::Detach).await
        });

        Ok(ConsumerHandle {
            shutdown: shutdown_tx,
            join,
        })
    }

    fn claim_consumer(&self) -> Result<()> {
        self.consumer_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| QueueError::ConsumerAlreadyRunning)
    }

    async fn consume(&self, mut shutdown: watch::Receiver<bool>, on_sender_drop: OnSenderDrop) {
        let _release = ConsumerRelease(&self.consumer_active);
        info!("Task queue consumer started");

        loop {
            let closed = shutdown.has_changed().is_err();
            if *shutdown.borrow() || (closed && on_sender_drop == OnSenderDrop::Stop) {
                break;
            }

            let next = {
                let mut state = self.state.lock();
                let next = state.buffer.pop_front();
                state.in_flight = next.is_some();
                next
            };

            let task = match next {
                Some(task) => task,
                None => {
                    if closed {
                        // Nothing can signal shutdown any more
                        self.available.notified().await;
                    } else {
                        tokio::select! {
                            _ = self.available.notified() => {}
                            _ = shutdown.changed() => {}
                        }
                    }
                    continue;
                }
            };

            self.execute(task).await;
        }

        info!("Task queue consumer stopped ({} pending)", self.pending());
    }

    async fn execute(&self, task: QueuedTask) {
        let QueuedTask {
            id,
            future,
            completion,
        } = task;

        let join = tokio::spawn(future);
        let in_flight = InFlight {
            queue: self,
            task: join.abort_handle(),
        };

        let outcome = match join.await {
            Ok(Ok(())) => {
                self.executed.fetch_add(1, Ordering::Relaxed);
                counter!("neuromem_tasks_executed_total").increment(1);
                debug!("Task {} completed", id);
                TaskOutcome::Completed
            }
            Ok(Err(e)) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                counter!("neuromem_tasks_failed_total").increment(1);
                warn!("Task {} failed: {}", id, e);
                TaskOutcome::Failed(e.to_string())
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                counter!("neuromem_tasks_failed_total").increment(1);
                let message = join_error_message(e);
                error!("Task {} panicked: {}", id, message);
                TaskOutcome::Panicked(message)
            }
        };
        drop(in_flight);

        if let Some(tx) = completion {
            let _ = tx.send(outcome);
        }
    }

    /// Wait until the buffer is empty and no task is executing.
    ///
    /// Without a running consumer this only returns if the queue is already idle.
    pub async fn drain(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// [`TaskQueue::drain`] with a deadline
    pub async fn drain_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.drain())
            .await
            .map_err(|_| QueueError::DrainTimeout {
                timeout_ms: timeout.as_millis() as u64,
                pending: self.pending(),
            })
    }

    fn finish_task(&self) {
        let mut state = self.state.lock();
        state.in_flight = false;
        if state.buffer.is_empty() {
            self.idle.notify_waiters();
        }
    }

    /// Buffered tasks plus the one executing, if any
    pub fn pending(&self) -> usize {
        let state = self.state.lock();
        state.buffer.len() + usize::from(state.in_flight)
    }

    /// Whether a consumer loop currently owns the queue
    pub fn has_consumer(&self) -> bool {
        self.consumer_active.load(Ordering::Acquire)
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            pending: self.pending(),
            capacity: self.config.capacity,
        }
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("config", &self.config)
            .field("pending", &self.pending())
            .field("consumer", &self.has_consumer())
            .finish()
    }
}

/// Handle to a consumer started with [`TaskQueue::spawn`]
#[derive(Debug)]
#[must_use = "dropping the handle detaches the consumer; call `shutdown` to stop it"]
pub struct ConsumerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ConsumerHandle {
    /// Signal the consumer to stop and wait for it to exit
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.join
            .await
            .map_err(|e| QueueError::Consumer(join_error_message(e)))
    }

    /// Whether the consumer has exited
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnSenderDrop {
    Stop,
    Detach,
}

/// Marks the executing task finished, including when the consumer is cancelled
struct InFlight<'a> {
    queue: &'a TaskQueue,
    task: AbortHandle,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        // No-op once the task has finished
        self.task.abort();
        self.queue.finish_task();
    }
}

struct ConsumerRelease<'a>(&'a AtomicBool);

impl Drop for ConsumerRelease<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn boxed<F, E>(op: F) -> TaskFuture
where
    F: Future<Output = std::result::Result<(), E>> + Send + 'static,
    E: Into<TaskError> + 'static,
{
    Box::pin(async move { op.await.map_err(Into::into) })
}

fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "cancelled".to_string();
    }
    panic_message(err.into_panic())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
