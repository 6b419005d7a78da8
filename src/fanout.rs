//! Bounded parallel fan-out with per-task failure isolation.
//!
//! A [`Batch`] holds independent tasks keyed by identity (platform name,
//! tweet id). [`FanOut::run`] drives them with at most `max_workers` in
//! flight, waits for every one of them, and folds the outcomes into an
//! [`Aggregate`]. A failing, panicking or timed-out task is logged with
//! its key and contributes nothing; the rest of the batch carries on.

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of tasks in flight.
pub const DEFAULT_MAX_WORKERS: usize = 16;

/// Hard ceiling on tasks in flight, whatever the configuration says.
pub const MAX_WORKERS: usize = 64;

/// Default per-task timeout.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(300);

/// One unit of concurrent work.
pub struct Task<K, T, E> {
    pub key: K,
    pub timeout: Duration,
    work: BoxFuture<'static, Result<T, E>>,
}

impl<K, T, E> Task<K, T, E> {
    pub fn new<F>(key: K, timeout: Duration, work: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            key,
            timeout,
            work: Box::pin(work),
        }
    }
}

/// Outcome of a single task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult<T> {
    Success(T),
    Failure(String),
}

/// Tasks submitted together. Keys are unique within a batch.
pub struct Batch<K, T, E> {
    tasks: Vec<Task<K, T, E>>,
    keys: HashSet<K>,
}

impl<K, T, E> Default for Batch<K, T, E> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            keys: HashSet::new(),
        }
    }
}

impl<K, T, E> Batch<K, T, E>
where
    K: Eq + Hash + Clone + Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Returns `false` (and drops the task) if its key is
    /// already in the batch.
    pub fn push(&mut self, task: Task<K, T, E>) -> bool {
        if !self.keys.insert(task.key.clone()) {
            warn!("Skipping duplicate task key: {}", task.key);
            return false;
        }
        self.tasks.push(task);
        true
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<K, T, E> FromIterator<Task<K, T, E>> for Batch<K, T, E>
where
    K: Eq + Hash + Clone + Display,
{
    fn from_iter<I: IntoIterator<Item = Task<K, T, E>>>(iter: I) -> Self {
        let mut batch = Batch::new();
        for task in iter {
            batch.push(task);
        }
        batch
    }
}

/// Everything a batch produced, in completion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<K, T> {
    pub successes: Vec<(K, T)>,
    pub failures: Vec<(K, String)>,
}

impl<K, T> Default for Aggregate<K, T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<K, T> Aggregate<K, T> {
    /// Number of tasks that reported, successful or not.
    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenate all successful payloads. Failed tasks contribute nothing.
    pub fn into_flat<I>(self) -> Vec<I>
    where
        T: IntoIterator<Item = I>,
    {
        self.successes
            .into_iter()
            .flat_map(|(_, payload)| payload)
            .collect()
    }

    /// One entry per submitted key; failed keys map to `T::default()`.
    pub fn into_keyed<C>(self) -> C
    where
        T: Default,
        C: FromIterator<(K, T)>,
    {
        self.successes
            .into_iter()
            .chain(
                self.failures
                    .into_iter()
                    .map(|(key, _)| (key, T::default())),
            )
            .collect()
    }
}

/// Side channel notified once per completed task.
pub trait Progress: Send + Sync {
    fn on_complete(&self);
}

/// Progress sink that ignores ticks.
pub struct NoProgress;

impl Progress for NoProgress {
    fn on_complete(&self) {}
}

impl Progress for indicatif::ProgressBar {
    fn on_complete(&self) {
        self.inc(1);
    }
}

/// Bounded fan-out executor.
#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    max_workers: usize,
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}

impl FanOut {
    /// `max_workers` is clamped to `1..=MAX_WORKERS`.
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.clamp(1, MAX_WORKERS),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run every task in the batch and wait for all of them.
    pub async fn run<K, T, E, P>(&self, batch: Batch<K, T, E>, progress: &P) -> Aggregate<K, T>
    where
        K: Eq + Hash + Clone + Display + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
        P: Progress + ?Sized,
    {
        let mut aggregate = Aggregate::default();
        if batch.is_empty() {
            return aggregate;
        }

        let workers = self.max_workers.min(batch.len());
        debug!("Dispatching {} tasks on {} workers", batch.len(), workers);

        let mut completions = stream::iter(batch.tasks.into_iter().map(run_task))
            .buffer_unordered(workers);

        while let Some((key, result)) = completions.next().await {
            progress.on_complete();
            match result {
                TaskResult::Success(payload) => {
                    debug!("Task {} completed", key);
                    aggregate.successes.push((key, payload));
                }
                TaskResult::Failure(message) => {
                    warn!("Task {} failed: {}", key, message);
                    aggregate.failures.push((key, message));
                }
            }
        }

        aggregate
    }
}

async fn run_task<K, T, E>(task: Task<K, T, E>) -> (K, TaskResult<T>)
where
    T: Send + 'static,
    E: Display + Send + 'static,
{
    let Task { key, timeout, work } = task;
    let handle = tokio::spawn(work);
    let abort = handle.abort_handle();

    let result = match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Ok(payload))) => TaskResult::Success(payload),
        Ok(Ok(Err(e))) => TaskResult::Failure(e.to_string()),
        Ok(Err(join_err)) => TaskResult::Failure(format!("task aborted: {}", join_err)),
        Err(_) => {
            abort.abort();
            TaskResult::Failure(format!("timed out after {}s", timeout.as_secs_f64()))
        }
    };

    (key, result)
}
