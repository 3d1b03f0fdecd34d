//! The unit of work the engine repeats.

use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A schedulable unit of work.
///
/// The engine treats the task as a black box: it may fail, and failures are
/// retried or treated as fatal according to the configured failure delay.
/// Long-running tasks should watch `cancel` and return early when it fires;
/// the engine itself observes cancellation only between invocations.
#[async_trait]
pub trait Task: Send + Sync {
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}

/// Adapter turning an async closure into a [`Task`].
pub struct TaskFn<F>(F);

impl<F> TaskFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        (self.0)(cancel).await
    }
}
