//! Settle-style fan-out.
//!
//! [`TaskSet`] spawns labelled tasks and [`TaskSet::settle`] awaits every
//! one of them to a terminal state. A task that fails, panics, or is
//! aborted never cancels or short-circuits its siblings; its [`JoinError`]
//! comes back as a value next to its label for the caller to record.

use std::future::Future;

use futures::future::join_all;
use tokio::task::{JoinError, JoinHandle};

/// Labelled set of spawned tasks, awaited together.
pub struct TaskSet<L, T> {
    tasks: Vec<(L, JoinHandle<T>)>,
}

impl<L, T> TaskSet<L, T>
where
    T: Send + 'static,
{
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Spawn `future` on the runtime and remember it under `label`.
    pub fn spawn<F>(&mut self, label: L, future: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.tasks.push((label, tokio::spawn(future)));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Await every task exactly once, in spawn order.
    pub async fn settle(self) -> Vec<(L, Result<T, JoinError>)> {
        let (labels, handles): (Vec<L>, Vec<JoinHandle<T>>) = self.tasks.into_iter().unzip();
        let results = join_all(handles).await;
        labels.into_iter().zip(results).collect()
    }
}

impl<L, T> Default for TaskSet<L, T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
