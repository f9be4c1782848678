//! # Bounded Queue Demo
//!
//! Runs a batch of timer-backed tasks through a small bounded-concurrency
//! dispatcher and prints each outcome. Even inputs succeed, odd inputs fail.
//!
//! ## Usage
//! ```bash
//! RUST_LOG=turul_async_task=debug cargo run --example bounded-queue -- --count 10 --max-concurrent 3
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Semaphore;
use tracing::info;
use turul_async_task::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of tasks to run
    #[arg(short, long, default_value = "20")]
    count: u64,

    /// Maximum tasks in flight at once (at least 1)
    #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u64).range(1..))]
    max_concurrent: u64,
}

#[derive(Debug, Clone, thiserror::Error)]
enum DemoError {
    #[error("{0} is odd")]
    ValueIsOdd(u64),
}

struct TimerTask {
    value: u64,
    task: AsyncTask<String, DemoError>,
}

impl AsyncOperation for TimerTask {
    type Success = String;
    type Failure = DemoError;

    fn task(&self) -> &AsyncTask<String, DemoError> {
        &self.task
    }

    fn run(self: Arc<Self>) {
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(self.value * 10));
            if self.value % 2 == 0 {
                self.finish(Ok(format!("{} is even", self.value)));
            } else {
                self.finish(Err(DemoError::ValueIsOdd(self.value)));
            }
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let permits = Arc::new(Semaphore::new(args.max_concurrent as usize));

    let tasks: Vec<Arc<TimerTask>> = (1..=args.count)
        .map(|value| {
            Arc::new(TimerTask {
                value,
                task: AsyncTask::with_config(
                    AsyncTaskConfig::new().with_label(format!("timer-{value}")),
                ),
            })
        })
        .collect();

    let mut workers = Vec::new();
    for task in &tasks {
        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .context("dispatcher semaphore closed")?;
        let task = Arc::clone(task);
        workers.push(tokio::spawn(async move {
            let scheduled: Arc<dyn ScheduledTask> = task;
            let begin = Arc::clone(&scheduled);
            tokio::task::spawn_blocking(move || begin.begin()).await?;
            scheduled.finished().await;
            drop(permit);
            Ok::<_, tokio::task::JoinError>(())
        }));
    }
    for worker in workers {
        worker.await.context("dispatcher worker panicked")??;
    }

    for task in &tasks {
        match task.result() {
            Some(Ok(message)) => info!(task = %task.label(), %message, "succeeded"),
            Some(Err(err)) => info!(task = %task.label(), error = %err, "failed"),
            None => info!(task = %task.label(), "never finished"),
        }
    }
    Ok(())
}
