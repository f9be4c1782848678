//! Task state machine enforcement.
//!
//! Validates transitions of the one-shot task lifecycle:
//!
//! ```text
//! Unstarted -> Executing | Finished
//! Executing -> Finished
//! Finished  -> ERROR (terminal, no further transitions)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Payload-free view of a task's lifecycle position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPhase {
    /// No work begun yet
    Unstarted,
    /// `begin()` ran; waiting for `finish()`
    Executing,
    /// An outcome has been stored
    Finished,
}

impl TaskPhase {
    pub fn is_executing(self) -> bool {
        matches!(self, TaskPhase::Executing)
    }

    pub fn is_finished(self) -> bool {
        matches!(self, TaskPhase::Finished)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskPhase::Unstarted => "unstarted",
            TaskPhase::Executing => "executing",
            TaskPhase::Finished => "finished",
        }
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An observable boolean projection of [`TaskPhase`].
///
/// Schedulers watch the two flags independently, so each one gets its own
/// change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskFlag {
    #[serde(rename = "isExecuting")]
    IsExecuting,
    #[serde(rename = "isFinished")]
    IsFinished,
}

impl TaskFlag {
    /// All flags, in notification order.
    pub const ALL: [TaskFlag; 2] = [TaskFlag::IsExecuting, TaskFlag::IsFinished];

    /// The observable key name of this flag.
    pub fn key(self) -> &'static str {
        match self {
            TaskFlag::IsExecuting => "isExecuting",
            TaskFlag::IsFinished => "isFinished",
        }
    }

    /// The flag's value while a task is in `phase`.
    pub fn value_in(self, phase: TaskPhase) -> bool {
        match self {
            TaskFlag::IsExecuting => phase.is_executing(),
            TaskFlag::IsFinished => phase.is_finished(),
        }
    }
}

impl fmt::Display for TaskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Validate a phase transition.
///
/// `allow_finish_before_begin` decides whether `Unstarted -> Finished` is legal.
/// Returns `Ok(())` if the transition is valid, or the violated rule otherwise.
pub fn validate_transition(
    from: TaskPhase,
    to: TaskPhase,
    allow_finish_before_begin: bool,
) -> Result<(), TaskError> {
    match (from, to) {
        (TaskPhase::Finished, _) => Err(TaskError::AlreadyFinished),
        (TaskPhase::Unstarted, TaskPhase::Executing) => Ok(()),
        (TaskPhase::Executing, TaskPhase::Finished) => Ok(()),
        (TaskPhase::Unstarted, TaskPhase::Finished) => {
            if allow_finish_before_begin {
                Ok(())
            } else {
                Err(TaskError::NotStarted)
            }
        }
        (TaskPhase::Executing, TaskPhase::Executing) => {
            Err(TaskError::AlreadyStarted { current: from })
        }
        (current, requested) => Err(TaskError::InvalidTransition { current, requested }),
    }
}

/// Flags whose value differs between `from` and `to`, in notification order.
pub fn changed_flags(from: TaskPhase, to: TaskPhase) -> impl Iterator<Item = TaskFlag> {
    TaskFlag::ALL
        .into_iter()
        .filter(move |flag| flag.value_in(from) != flag.value_in(to))
}
