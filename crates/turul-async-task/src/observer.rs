//! Flag change observers.
//!
//! An observer receives a `will_change` call strictly before a flag's new value
//! becomes readable and a `did_change` call strictly after. Callbacks run on
//! whichever thread performed the transition, with no task lock held, so they
//! may read the task's flags and result. They must not drive transitions of the
//! task they observe.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::state_machine::TaskFlag;

/// Receives change notifications for a task's observable flags.
pub trait TaskObserver: Send + Sync {
    /// Called before `flag` takes its new value.
    fn will_change(&self, flag: TaskFlag);

    /// Called once `flag`'s new value is visible.
    fn did_change(&self, flag: TaskFlag);
}

/// Registration handle returned by `add_observer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Registered observers of a single task.
pub(crate) struct ObserverList {
    next_id: AtomicU64,
    entries: RwLock<Vec<(ObserverId, Arc<dyn TaskObserver>)>>,
}

impl ObserverList {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, observer: Arc<dyn TaskObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, observer));
        id
    }

    pub(crate) fn remove(&self, id: ObserverId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Observers registered right now.
    ///
    /// A transition notifies one snapshot for both its will and did calls, so an
    /// observer added mid-transition never sees an unpaired `did_change`.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn TaskObserver>> {
        self.entries
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect()
    }
}
