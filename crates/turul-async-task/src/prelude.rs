//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use turul_async_task::prelude::*;
//! ```

pub use crate::config::AsyncTaskConfig;
pub use crate::error::TaskError;
pub use crate::observer::{ObserverId, TaskObserver};
pub use crate::operation::{AsyncOperation, FnOperation, ScheduledTask};
pub use crate::state_machine::{TaskFlag, TaskPhase};
pub use crate::task::AsyncTask;
