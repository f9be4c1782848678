//! `AsyncTask`, the observable one-shot state cell.
//!
//! All reads and writes of the state go through one `RwLock`. Writers are
//! additionally serialized by a transition mutex held across the whole
//! validate → will-change → write → did-change sequence, so the notification
//! pairs of two racing writers never interleave. The state lock itself is only
//! held for the O(1) read or swap and never while observers run.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, error, trace, warn};

use crate::config::AsyncTaskConfig;
use crate::error::TaskError;
use crate::observer::{ObserverId, ObserverList, TaskObserver};
use crate::state_machine::{self, TaskFlag, TaskPhase};

enum State<S, F> {
    Unstarted,
    Executing,
    Finished(Result<S, F>),
}

impl<S, F> State<S, F> {
    fn phase(&self) -> TaskPhase {
        match self {
            State::Unstarted => TaskPhase::Unstarted,
            State::Executing => TaskPhase::Executing,
            State::Finished(_) => TaskPhase::Finished,
        }
    }
}

/// Run an observer callback, keeping the first panic payload for later.
fn capture_panic(slot: &mut Option<Box<dyn Any + Send>>, callback: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        if slot.is_none() {
            *slot = Some(payload);
        }
    }
}

/// A unit of work whose completion is signaled asynchronously.
///
/// Created `Unstarted`, moves to `Executing` on [`start`](Self::start) and to
/// `Finished` exactly once on [`finish`](Self::finish), which may be called from
/// any thread. Once finished the outcome never changes.
///
/// `is_executing` and `is_finished` are projections of the state. Every flip of
/// either flag is announced to registered [`TaskObserver`]s and the new phase is
/// then published on a watch channel (see [`subscribe`](Self::subscribe)).
pub struct AsyncTask<S, F> {
    config: AsyncTaskConfig,
    state: RwLock<State<S, F>>,
    transition: Mutex<()>,
    observers: ObserverList,
    phase_tx: watch::Sender<TaskPhase>,
}

impl<S, F> AsyncTask<S, F>
where
    F: std::error::Error,
{
    /// Create an unstarted task with default configuration.
    pub fn new() -> Self {
        Self::with_config(AsyncTaskConfig::default())
    }

    /// Create an unstarted task with custom configuration.
    pub fn with_config(config: AsyncTaskConfig) -> Self {
        let (phase_tx, _) = watch::channel(TaskPhase::Unstarted);
        Self {
            config,
            state: RwLock::new(State::Unstarted),
            transition: Mutex::new(()),
            observers: ObserverList::new(),
            phase_tx,
        }
    }

    pub fn config(&self) -> &AsyncTaskConfig {
        &self.config
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    // === Observable state ===

    /// Consistent snapshot of the current phase.
    pub fn phase(&self) -> TaskPhase {
        self.state.read().phase()
    }

    pub fn is_executing(&self) -> bool {
        self.phase().is_executing()
    }

    pub fn is_finished(&self) -> bool {
        self.phase().is_finished()
    }

    /// Always `true`: returning from `begin()` does not mean the work is done.
    pub fn is_asynchronous(&self) -> bool {
        true
    }

    /// Borrow the stored outcome, if finished, without cloning it.
    pub fn with_result<R>(&self, f: impl FnOnce(&Result<S, F>) -> R) -> Option<R> {
        match &*self.state.read() {
            State::Finished(outcome) => Some(f(outcome)),
            _ => None,
        }
    }

    // === Transitions ===

    /// Move `Unstarted -> Executing`.
    ///
    /// # Panics
    ///
    /// Panics if the task already started or finished.
    pub fn start(&self) {
        if let Err(err) = self.try_start() {
            self.violation("start", err);
        }
    }

    /// Move `Unstarted -> Executing`, reporting a violation instead of panicking.
    pub fn try_start(&self) -> Result<(), TaskError> {
        self.transition(State::Executing)?;
        debug!(task = %self.config.label, "Task executing");
        Ok(())
    }

    /// Start the task and run `body` synchronously on the calling thread.
    ///
    /// `body` either finishes the task before returning or arranges for some
    /// other context to finish it later.
    pub fn begin_with(&self, body: impl FnOnce(&Self)) {
        self.start();
        body(self);
    }

    /// Store `outcome` and move to `Finished`.
    ///
    /// # Panics
    ///
    /// Panics if the task is already finished: double completion is a caller
    /// bug. The first outcome is left untouched.
    pub fn finish(&self, outcome: Result<S, F>) {
        if let Err(err) = self.try_finish(outcome) {
            self.violation("finish", err);
        }
    }

    /// Store `outcome` and move to `Finished`, reporting a violation instead of
    /// panicking. On error the rejected outcome is dropped.
    pub fn try_finish(&self, outcome: Result<S, F>) -> Result<(), TaskError> {
        let success = outcome.is_ok();
        self.transition(State::Finished(outcome))?;
        debug!(task = %self.config.label, success, "Task finished");
        Ok(())
    }

    fn transition(&self, next: State<S, F>) -> Result<(), TaskError> {
        let _serialized = self.transition.lock();

        let from = self.phase();
        let to = next.phase();
        state_machine::validate_transition(from, to, self.config.allow_finish_before_begin)?;
        if from == TaskPhase::Unstarted && to == TaskPhase::Finished {
            warn!(task = %self.config.label, "Task finished before begin()");
        }

        let observers = self.observers.snapshot();
        let changed: Vec<TaskFlag> = state_machine::changed_flags(from, to).collect();

        // A panicking observer must not cut the sequence short: every will has
        // its did and the phase is published before the first panic resumes
        let mut observer_panic = None;

        for flag in &changed {
            for observer in &observers {
                capture_panic(&mut observer_panic, || observer.will_change(*flag));
            }
        }

        *self.state.write() = next;

        for flag in &changed {
            for observer in &observers {
                capture_panic(&mut observer_panic, || observer.did_change(*flag));
            }
        }
        self.phase_tx.send_replace(to);

        trace!(task = %self.config.label, %from, %to, "Task phase changed");

        if let Some(payload) = observer_panic {
            error!(task = %self.config.label, %to, "Task observer panicked during transition");
            panic::resume_unwind(payload);
        }
        Ok(())
    }

    fn violation(&self, operation: &'static str, err: TaskError) -> ! {
        error!(
            task = %self.config.label,
            operation,
            phase = %self.phase(),
            error = %err,
            "Task protocol violation"
        );
        panic!("{err}");
    }

    // === Notification ===

    /// Register an observer for flag changes.
    pub fn add_observer(&self, observer: Arc<dyn TaskObserver>) -> ObserverId {
        let id = self.observers.add(observer);
        debug!(task = %self.config.label, observer = id.as_u64(), "Observer registered");
        id
    }

    /// Unregister an observer. Returns `false` if it was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Receiver of the task's phase, updated after each transition's
    /// did-change notifications.
    pub fn subscribe(&self) -> watch::Receiver<TaskPhase> {
        self.phase_tx.subscribe()
    }

    /// Wait until the task is finished.
    ///
    /// Returns immediately if it already is. Never resolves for a task nobody
    /// finishes.
    pub async fn finished(&self) {
        let mut rx = self.phase_tx.subscribe();
        // wait_for checks the current value first; the sender lives as long as
        // `self`, so it cannot close while we wait
        let _ = rx.wait_for(|phase| phase.is_finished()).await;
    }
}

impl<S, F> AsyncTask<S, F>
where
    S: Clone,
    F: std::error::Error + Clone,
{
    /// The stored outcome once finished, `None` before.
    pub fn result(&self) -> Option<Result<S, F>> {
        self.with_result(Clone::clone)
    }
}

impl<S, F> Default for AsyncTask<S, F>
where
    F: std::error::Error,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, F> fmt::Debug for AsyncTask<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTask")
            .field("label", &self.config.label)
            .field("phase", &self.state.read().phase())
            .field("observers", &self.observers.len())
            .finish()
    }
}
