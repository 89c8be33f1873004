use std::time::Duration;

use futures::{executor::ThreadPool, future::abortable};
use tracing::trace;

use crate::error::RxError;

use super::{Executor, TaskHandle};

/// A concurrent queue over a `futures` thread pool. Tasks may run in
/// parallel and in any order.
#[derive(Clone, Debug)]
pub struct ThreadPoolExecutor {
  pool: ThreadPool,
}

impl ThreadPoolExecutor {
  /// A pool with one worker per CPU.
  pub fn new() -> Result<Self, RxError> { Self::builder().create() }

  pub fn builder() -> ThreadPoolBuilder { ThreadPoolBuilder::default() }
}

/// Configures a [`ThreadPoolExecutor`].
#[derive(Clone, Debug, Default)]
pub struct ThreadPoolBuilder {
  pool_size: Option<usize>,
  name_prefix: Option<String>,
}

impl ThreadPoolBuilder {
  pub fn pool_size(mut self, size: usize) -> Self {
    self.pool_size = Some(size);
    self
  }

  pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.name_prefix = Some(prefix.into());
    self
  }

  pub fn create(self) -> Result<ThreadPoolExecutor, RxError> {
    let mut builder = ThreadPool::builder();
    if let Some(size) = self.pool_size {
      builder.pool_size(size);
    }
    if let Some(prefix) = self.name_prefix {
      builder.name_prefix(prefix);
    }
    let pool = builder
      .create()
      .map_err(|e| RxError::ExecutorUnavailable(e.to_string()))?;
    Ok(ThreadPoolExecutor { pool })
  }
}

impl Executor for ThreadPoolExecutor {
  fn run_async<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let job = handle.guard(task);
    self.pool.spawn_ok(async move { job() });
    handle
  }

  fn run_after<F>(&self, delay: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let job = handle.guard(task);
    let (fut, abort) = abortable(async move {
      sleep(delay).await;
      job()
    });
    handle.set_abort(abort);
    trace!(?delay, "spawn delayed pool task");
    self.pool.spawn_ok(async move {
      let _ = fut.await;
    });
    handle
  }
}

#[cfg(feature = "timer")]
async fn sleep(delay: Duration) {
  futures_time::task::sleep(delay.into()).await;
}

#[cfg(not(feature = "timer"))]
async fn sleep(delay: Duration) { std::thread::sleep(delay) }
