use std::{
  sync::{Arc, OnceLock},
  thread::{self, ThreadId},
  time::Duration,
};

use tracing::{trace, warn};

use crate::error::RxError;

use super::{queue::TaskQueue, Executor, TaskHandle};

/// The main executor: a single-threaded FIFO queue drained explicitly by
/// the thread that owns it.
///
/// Any thread may submit work. The first thread to drain the queue becomes
/// its owner, and later drains from other threads fail with
/// [`RxError::NotMainThread`].
#[derive(Clone, Default)]
pub struct MainQueue {
  queue: Arc<TaskQueue>,
  owner: Arc<OnceLock<ThreadId>>,
}

impl MainQueue {
  pub fn new() -> Self { Self::default() }

  /// Claims the calling thread as owner without draining anything.
  pub fn bind_current_thread(&self) -> Result<(), RxError> { self.check_owner() }

  /// `true` when called from the owning thread.
  pub fn is_main_thread(&self) -> bool {
    self.owner.get() == Some(&thread::current().id())
  }

  /// Runs every task that is ready now, including tasks those tasks queue,
  /// and returns how many ran.
  pub fn run_pending(&self) -> Result<usize, RxError> {
    self.check_owner()?;
    let mut count = 0;
    while let Some(job) = self.queue.try_pop() {
      job();
      count += 1;
    }
    Ok(count)
  }

  /// Like [`run_pending`](Self::run_pending), but also waits for delayed
  /// tasks until none are left.
  pub fn run_until_idle(&self) -> Result<usize, RxError> {
    let mut count = self.run_pending()?;
    while self.queue.wait_for_work() {
      count += self.run_pending()?;
    }
    Ok(count)
  }

  /// Number of tasks queued and not yet run.
  pub fn pending(&self) -> usize { self.queue.len() }

  fn check_owner(&self) -> Result<(), RxError> {
    let current = thread::current().id();
    let owner = *self.owner.get_or_init(|| current);
    if owner == current {
      Ok(())
    } else {
      warn!(?current, ?owner, "main queue drained off its owning thread");
      Err(RxError::NotMainThread)
    }
  }
}

impl Executor for MainQueue {
  fn run_async<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    trace!("queue main task");
    self.queue.push(Box::new(handle.guard(task)));
    handle
  }

  fn run_after<F>(&self, delay: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    trace!(?delay, "queue delayed main task");
    self.queue.push_after(delay, handle.clone(), Box::new(handle.guard(task)));
    handle
  }
}
