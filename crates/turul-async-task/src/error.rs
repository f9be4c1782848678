//! Error types for task lifecycle transitions.

use crate::state_machine::TaskPhase;

/// A protocol violation detected while changing a task's phase.
///
/// These are caller bugs, not runtime conditions. The panicking entry points
/// (`finish`, `begin`) report them by panicking with this error's display text;
/// the `try_*` variants hand them back instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Cannot change from finished state")]
    AlreadyFinished,

    #[error("Task already started: current phase is {current}")]
    AlreadyStarted { current: TaskPhase },

    #[error("Task finished before begin() was called")]
    NotStarted,

    #[error("Invalid state transition: {current} -> {requested}")]
    InvalidTransition {
        current: TaskPhase,
        requested: TaskPhase,
    },
}
