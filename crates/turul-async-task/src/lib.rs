//! # Async Task
//!
//! **An observable, one-shot state machine for work that completes asynchronously.**
//!
//! A task queue dispatches a task by calling `begin()` on a worker thread and
//! considers the slot taken until the task reports `is_finished`. The work itself
//! may complete much later, from a timer or an I/O callback on some other
//! thread. `AsyncTask` is the thread-safe cell in between: it tracks
//! `Unstarted → Executing → Finished(outcome)`, rejects illegal transitions and
//! announces every flag change to whoever is watching.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use turul_async_task::prelude::*;
//!
//! let op: Arc<FnOperation<String, std::fmt::Error>> = FnOperation::new(|op| {
//!     std::thread::spawn(move || {
//!         std::thread::sleep(Duration::from_millis(5));
//!         op.finish(Ok("done".to_string()));
//!     });
//! });
//!
//! Arc::clone(&op).begin();
//! while !op.is_finished() {
//!     std::thread::yield_now();
//! }
//! assert_eq!(op.result(), Some(Ok("done".to_string())));
//! ```
//!
//! ## Architecture
//!
//! - **`AsyncTask`**: the state cell (state guard, observer list, phase watch channel)
//! - **`AsyncOperation`**: implemented by types that own work and embed an `AsyncTask`
//! - **`ScheduledTask`**: type-erased view a scheduler holds (`Arc<dyn ScheduledTask>`)
//! - **`TaskObserver`**: will/did change callbacks for `isExecuting` / `isFinished`
//! - **State machine**: pure transition validation shared by all of the above
//!
//! Finishing a task twice is a caller bug and panics; `try_finish` reports it
//! as a [`TaskError`] instead.

// Core modules
pub mod config;
pub mod error;
pub mod observer;
pub mod operation;
pub mod prelude;
pub mod state_machine;
pub mod task;

// Re-exports for convenience
pub use config::AsyncTaskConfig;
pub use error::TaskError;
pub use observer::{ObserverId, TaskObserver};
pub use operation::{AsyncOperation, FnOperation, ScheduledTask};
pub use state_machine::{TaskFlag, TaskPhase, changed_flags, validate_transition};
pub use task::AsyncTask;
