//! Executors run the work an observable hands off: timers, delayed flushes
//! and cross-thread delivery.
//!
//! There is no process-wide default. Every timed operator takes an executor
//! value, so tests swap in a [`VirtualTimeExecutor`] and applications pick a
//! thread pool, a serial queue or the [`MainQueue`].

use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
  },
  time::Duration,
};

use futures::future::AbortHandle;

use crate::{error::RxError, subscription::Subscription};

mod immediate;
mod main_queue;
mod queue;
mod serial;
#[cfg(feature = "futures-scheduler")]
mod thread_pool;
#[cfg(feature = "tokio-scheduler")]
mod tokio_executor;
mod virtual_time;

pub use immediate::ImmediateExecutor;
pub use main_queue::MainQueue;
pub use serial::SerialExecutor;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool::{ThreadPoolBuilder, ThreadPoolExecutor};
#[cfg(feature = "tokio-scheduler")]
pub use tokio_executor::TokioExecutor;
pub use virtual_time::VirtualTimeExecutor;

/// A handle that runs closures now, later, or elsewhere.
///
/// Handles are cheap to clone and every clone drives the same underlying
/// queue or pool.
pub trait Executor: Clone + Send + Sync + 'static {
  /// Queues `task` to run as soon as the executor gets to it.
  fn run_async<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static;

  /// Queues `task` to run once `delay` has elapsed. The wait never blocks
  /// the calling thread.
  fn run_after<F>(&self, delay: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static;

  /// Runs `task` on the executor and blocks until it returns its result.
  ///
  /// Calling this from a task already running on the same serial executor
  /// (or from the thread draining a [`MainQueue`]) deadlocks. This is not
  /// detected.
  fn run_sync<F, R>(&self, task: F) -> Result<R, RxError>
  where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
  {
    let (tx, rx) = futures::channel::oneshot::channel();
    self.run_async(move || {
      let _ = tx.send(task());
    });
    futures::executor::block_on(rx).map_err(|_| RxError::Cancelled)
  }
}

struct TaskState {
  cancelled: AtomicBool,
  finished: AtomicBool,
  abort: Mutex<Option<AbortHandle>>,
}

/// Subscription for a scheduled task. Unsubscribing before the task starts
/// cancels it; after it ran, unsubscribing does nothing.
#[derive(Clone)]
pub struct TaskHandle(Arc<TaskState>);

impl TaskHandle {
  pub fn new() -> Self {
    TaskHandle(Arc::new(TaskState {
      cancelled: AtomicBool::new(false),
      finished: AtomicBool::new(false),
      abort: Mutex::new(None),
    }))
  }

  /// A handle for work that already ran.
  pub fn finished() -> Self {
    let handle = Self::new();
    handle.0.finished.store(true, Ordering::Release);
    handle
  }

  #[inline]
  pub fn is_cancelled(&self) -> bool { self.0.cancelled.load(Ordering::Acquire) }

  #[inline]
  pub fn is_finished(&self) -> bool { self.0.finished.load(Ordering::Acquire) }

  /// Attaches the abort handle of the future driving this task, so that
  /// cancelling also stops a pending timer.
  pub(crate) fn set_abort(&self, abort: AbortHandle) {
    let mut slot = self.0.abort.lock().unwrap_or_else(PoisonError::into_inner);
    if self.is_cancelled() {
      abort.abort();
    } else {
      *slot = Some(abort);
    }
  }

  /// Wraps `task` so it is skipped once this handle is cancelled and marks
  /// the handle finished after it ran.
  pub(crate) fn guard<F>(&self, task: F) -> impl FnOnce() + Send + 'static
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = self.clone();
    move || {
      if !handle.is_cancelled() {
        task();
      }
      handle.0.finished.store(true, Ordering::Release);
    }
  }
}

impl Default for TaskHandle {
  fn default() -> Self { Self::new() }
}

impl Subscription for TaskHandle {
  fn unsubscribe(self) {
    if self.0.cancelled.swap(true, Ordering::AcqRel) {
      return;
    }
    let abort = self
      .0
      .abort
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();
    if let Some(abort) = abort {
      abort.abort();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.is_cancelled() || self.is_finished() }
}

impl Debug for TaskHandle {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TaskHandle")
      .field("cancelled", &self.is_cancelled())
      .field("finished", &self.is_finished())
      .finish()
  }
}
