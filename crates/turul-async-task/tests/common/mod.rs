//! Test scheduler: a bounded-concurrency queue standing in for the external
//! task queue that owns dispatch and joining.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;
use turul_async_task::ScheduledTask;

/// Dispatches tasks in FIFO order, at most `max_concurrent` in flight.
///
/// A slot is held from `begin()` until the task reports finished, regardless
/// of when `begin()` itself returns.
pub struct BoundedQueue {
    permits: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl BoundedQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Highest number of tasks observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Queue `tasks`; if `wait_until_finished`, return only once all finished.
    pub async fn add_tasks(
        &self,
        tasks: Vec<Arc<dyn ScheduledTask>>,
        wait_until_finished: bool,
    ) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .expect("queue semaphore closed");
            let in_flight = Arc::clone(&self.in_flight);
            let peak = Arc::clone(&self.peak);

            handles.push(tokio::spawn(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);

                let worker = Arc::clone(&task);
                tokio::task::spawn_blocking(move || worker.begin())
                    .await
                    .expect("begin() panicked on worker");

                task.finished().await;
                debug!(task = %task.label(), "Queue slot released");
                in_flight.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
            }));
        }

        if wait_until_finished {
            for handle in handles.drain(..) {
                handle.await.expect("queue worker panicked");
            }
        }
        handles
    }
}
