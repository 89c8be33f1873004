use std::time::Duration;

use futures::future::abortable;
use tokio::runtime::Handle;

use super::{Executor, TaskHandle};

/// Runs tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioExecutor {
  handle: Handle,
}

impl TokioExecutor {
  pub fn new(handle: Handle) -> Self { TokioExecutor { handle } }

  /// Uses the runtime the caller is running in.
  ///
  /// # Panics
  ///
  /// Panics when called outside a tokio runtime.
  pub fn current() -> Self { Self::new(Handle::current()) }
}

impl Executor for TokioExecutor {
  fn run_async<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let job = handle.guard(task);
    self.handle.spawn(async move { job() });
    handle
  }

  fn run_after<F>(&self, delay: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let job = handle.guard(task);
    let (fut, abort) = abortable(async move {
      tokio::time::sleep(delay).await;
      job()
    });
    handle.set_abort(abort);
    self.handle.spawn(fut);
    handle
  }
}
