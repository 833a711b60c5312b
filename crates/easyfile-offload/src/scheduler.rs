use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::config::OffloadConfig;
use crate::error::{OffloadError, OffloadResult};

/// Runs blocking closures on tokio's blocking pool, at most `max_workers`
/// at a time.
///
/// Cloning is cheap; clones share the same worker budget.
#[derive(Clone)]
pub struct OffloadScheduler {
    runtime: Handle,
    permits: Arc<Semaphore>,
    max_workers: usize,
}

impl OffloadScheduler {
    /// Bind to the runtime of the calling thread.
    pub fn new(config: OffloadConfig) -> OffloadResult<Self> {
        let runtime = Handle::try_current().map_err(|_| OffloadError::NoRuntime)?;
        Ok(Self::with_handle(runtime, config))
    }

    /// Bind to an explicit runtime handle.
    pub fn with_handle(runtime: Handle, config: OffloadConfig) -> Self {
        let max_workers = config.max_workers.max(1);
        Self {
            runtime,
            permits: Arc::new(Semaphore::new(max_workers)),
            max_workers,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Workers not currently running a job.
    pub fn idle_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// Stop accepting work. Jobs already holding a worker run to completion;
    /// queued and future jobs fail with [`OffloadError::Closed`].
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Dispatch `work` immediately and return a handle to its result.
    ///
    /// Dropping the handle detaches the job; it still runs to completion.
    pub fn submit<T, W>(&self, work: W) -> TaskHandle<T>
    where
        W: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        debug!(idle = self.idle_workers(), "offload job submitted");
        let inner = self.runtime.spawn(run_blocking(Arc::clone(&self.permits), work));
        TaskHandle { inner }
    }

    /// Run every job concurrently and return the results in input order,
    /// whatever order they finish in.
    pub async fn batch<T, W, I>(&self, jobs: I) -> Vec<OffloadResult<T>>
    where
        I: IntoIterator<Item = W>,
        W: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut set = JoinSet::new();
        let mut total = 0usize;
        for (idx, work) in jobs.into_iter().enumerate() {
            let permits = Arc::clone(&self.permits);
            set.spawn_on(async move { (idx, run_blocking(permits, work).await) }, &self.runtime);
            total += 1;
        }
        debug!(jobs = total, "offload batch submitted");

        let mut slots: Vec<Option<OffloadResult<T>>> = (0..total).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(err) => warn!(error = %err, "offload batch member lost"),
            }
        }

        let results: Vec<_> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Err(OffloadError::Cancelled)))
            .collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        debug!(jobs = total, failed, "offload batch complete");
        results
    }
}

impl fmt::Debug for OffloadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffloadScheduler")
            .field("max_workers", &self.max_workers)
            .field("idle_workers", &self.idle_workers())
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn run_blocking<T, W>(permits: Arc<Semaphore>, work: W) -> OffloadResult<T>
where
    W: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let permit = permits
        .acquire_owned()
        .await
        .map_err(|_| OffloadError::Closed)?;
    let result = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        work()
    })
    .await;
    result.map_err(OffloadError::from)
}

/// Future resolving to the result of a submitted job.
pub struct TaskHandle<T> {
    inner: JoinHandle<OffloadResult<T>>,
}

impl<T> TaskHandle<T> {
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = OffloadResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) => Poll::Ready(Err(err.into())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}
