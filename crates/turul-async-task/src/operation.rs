//! Operation traits: how concrete work plugs into an [`AsyncTask`].
//!
//! - [`AsyncOperation`] is implemented by the struct that owns the work: it
//!   embeds an `AsyncTask` and supplies the `run()` hook.
//! - [`ScheduledTask`] is the object-safe face a scheduler holds. Every
//!   `AsyncOperation` gets it for free, so a queue can keep
//!   `Arc<dyn ScheduledTask>` for tasks with different outcome types.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::config::AsyncTaskConfig;
use crate::error::TaskError;
use crate::observer::{ObserverId, TaskObserver};
use crate::state_machine::TaskPhase;
use crate::task::AsyncTask;

/// A unit of work that finishes asynchronously.
///
/// ```rust
/// use std::sync::Arc;
/// use turul_async_task::prelude::*;
///
/// struct Answer {
///     task: AsyncTask<u32, std::fmt::Error>,
/// }
///
/// impl AsyncOperation for Answer {
///     type Success = u32;
///     type Failure = std::fmt::Error;
///
///     fn task(&self) -> &AsyncTask<u32, std::fmt::Error> {
///         &self.task
///     }
///
///     fn run(self: Arc<Self>) {
///         self.finish(Ok(42));
///     }
/// }
///
/// let op = Arc::new(Answer { task: AsyncTask::new() });
/// Arc::clone(&op).begin();
/// assert!(op.is_finished());
/// assert_eq!(op.result(), Some(Ok(42)));
/// ```
pub trait AsyncOperation: Send + Sync + 'static {
    type Success: Send + Sync + 'static;
    type Failure: std::error::Error + Send + Sync + 'static;

    /// The state cell backing this operation.
    fn task(&self) -> &AsyncTask<Self::Success, Self::Failure>;

    /// The work itself, called once on the thread that calls `begin()`.
    ///
    /// Either call [`finish`](Self::finish) before returning, or hand `self`
    /// to whatever will call it later (a timer, a callback, another thread).
    fn run(self: Arc<Self>) {}

    /// Complete the operation. Panics on double completion.
    fn finish(&self, outcome: Result<Self::Success, Self::Failure>) {
        self.task().finish(outcome);
    }

    fn try_finish(&self, outcome: Result<Self::Success, Self::Failure>) -> Result<(), TaskError> {
        self.task().try_finish(outcome)
    }

    /// The stored outcome once finished.
    fn result(&self) -> Option<Result<Self::Success, Self::Failure>>
    where
        Self::Success: Clone,
        Self::Failure: Clone,
    {
        self.task().result()
    }
}

/// Scheduler-facing view of a task.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    /// Start the task and invoke its `run()` hook on the calling thread.
    ///
    /// # Panics
    ///
    /// Panics if the task already started or finished.
    fn begin(self: Arc<Self>);

    /// Like [`begin`](Self::begin), but reports a violation instead of
    /// panicking. `run()` is not invoked on error.
    fn try_begin(self: Arc<Self>) -> Result<(), TaskError>;

    fn label(&self) -> &str;

    fn phase(&self) -> TaskPhase;

    fn is_executing(&self) -> bool;

    fn is_finished(&self) -> bool;

    fn is_asynchronous(&self) -> bool {
        true
    }

    fn add_observer(&self, observer: Arc<dyn TaskObserver>) -> ObserverId;

    fn remove_observer(&self, id: ObserverId) -> bool;

    fn subscribe(&self) -> watch::Receiver<TaskPhase>;

    /// Wait until the task is finished.
    async fn finished(&self);
}

#[async_trait]
impl<T> ScheduledTask for T
where
    T: AsyncOperation,
{
    fn begin(self: Arc<Self>) {
        self.task().start();
        debug!(task = %self.task().label(), "Running task");
        self.run();
    }

    fn try_begin(self: Arc<Self>) -> Result<(), TaskError> {
        self.task().try_start()?;
        debug!(task = %self.task().label(), "Running task");
        self.run();
        Ok(())
    }

    fn label(&self) -> &str {
        self.task().label()
    }

    fn phase(&self) -> TaskPhase {
        self.task().phase()
    }

    fn is_executing(&self) -> bool {
        self.task().is_executing()
    }

    fn is_finished(&self) -> bool {
        self.task().is_finished()
    }

    fn is_asynchronous(&self) -> bool {
        self.task().is_asynchronous()
    }

    fn add_observer(&self, observer: Arc<dyn TaskObserver>) -> ObserverId {
        self.task().add_observer(observer)
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        self.task().remove_observer(id)
    }

    fn subscribe(&self) -> watch::Receiver<TaskPhase> {
        self.task().subscribe()
    }

    async fn finished(&self) {
        self.task().finished().await
    }
}

type RunFn<S, F> = Box<dyn FnOnce(Arc<FnOperation<S, F>>) + Send>;

/// Closure-backed operation for work that doesn't need its own type.
///
/// The closure receives the operation itself so it can move a handle into
/// whatever context eventually calls `finish`.
pub struct FnOperation<S, F> {
    task: AsyncTask<S, F>,
    body: Mutex<Option<RunFn<S, F>>>,
}

impl<S, F> FnOperation<S, F>
where
    S: Send + Sync + 'static,
    F: std::error::Error + Send + Sync + 'static,
{
    pub fn new(body: impl FnOnce(Arc<Self>) + Send + 'static) -> Arc<Self> {
        Self::with_config(AsyncTaskConfig::default(), body)
    }

    pub fn with_config(
        config: AsyncTaskConfig,
        body: impl FnOnce(Arc<Self>) + Send + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            task: AsyncTask::with_config(config),
            body: Mutex::new(Some(Box::new(body))),
        })
    }
}

impl<S, F> AsyncOperation for FnOperation<S, F>
where
    S: Send + Sync + 'static,
    F: std::error::Error + Send + Sync + 'static,
{
    type Success = S;
    type Failure = F;

    fn task(&self) -> &AsyncTask<S, F> {
        &self.task
    }

    fn run(self: Arc<Self>) {
        let body = self.body.lock().take();
        if let Some(body) = body {
            body(self);
        }
    }
}
