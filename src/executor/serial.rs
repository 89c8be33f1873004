use std::{
  fmt::{Debug, Formatter},
  sync::Arc,
  thread,
  time::Duration,
};

use tracing::{debug, trace};

use crate::error::RxError;

use super::{queue::TaskQueue, Executor, TaskHandle};

struct SerialInner {
  label: String,
  queue: Arc<TaskQueue>,
}

impl Drop for SerialInner {
  fn drop(&mut self) { self.queue.close(); }
}

/// A labelled serial queue: tasks run one at a time, in submission order,
/// on a dedicated worker thread named after the label.
///
/// Delayed tasks run in due-time order, ties broken by submission order.
/// The worker exits once the last handle is dropped and the ready tasks are
/// drained. A queued task that captures a clone keeps the worker alive
/// until it runs or is cancelled; cancelled delayed tasks are dropped from
/// the queue on its next use.
#[derive(Clone)]
pub struct SerialExecutor(Arc<SerialInner>);

impl SerialExecutor {
  pub fn new(label: impl Into<String>) -> Result<Self, RxError> {
    let label = label.into();
    let queue = Arc::new(TaskQueue::default());
    let worker_queue = queue.clone();
    let worker_label = label.clone();
    thread::Builder::new()
      .name(label.clone())
      .spawn(move || {
        debug!(label = %worker_label, "serial executor worker started");
        while let Some(job) = worker_queue.pop_blocking() {
          job();
        }
        debug!(label = %worker_label, "serial executor worker stopped");
      })
      .map_err(|e| RxError::ExecutorUnavailable(e.to_string()))?;
    Ok(SerialExecutor(Arc::new(SerialInner { label, queue })))
  }

  #[inline]
  pub fn label(&self) -> &str { &self.0.label }

  /// Number of tasks queued and not yet started.
  pub fn pending(&self) -> usize { self.0.queue.len() }
}

impl Executor for SerialExecutor {
  fn run_async<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    trace!(label = %self.0.label, "queue task");
    self.0.queue.push(Box::new(handle.guard(task)));
    handle
  }

  fn run_after<F>(&self, delay: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    trace!(label = %self.0.label, ?delay, "queue delayed task");
    self.0.queue.push_after(delay, handle.clone(), Box::new(handle.guard(task)));
    handle
  }
}

impl Debug for SerialExecutor {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SerialExecutor")
      .field("label", &self.0.label)
      .field("pending", &self.pending())
      .finish()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::subscription::Subscription;
  use std::sync::Mutex;

  #[test]
  fn runs_in_submission_order() {
    let executor = SerialExecutor::new("rxkit.test.serial").unwrap();
    let order = Arc::new(Mutex::new(vec![]));
    for i in 0..50 {
      let c_order = order.clone();
      executor.run_async(move || c_order.lock().unwrap().push(i));
    }
    let name = executor
      .run_sync(|| thread::current().name().map(str::to_owned))
      .unwrap();

    assert_eq!(*order.lock().unwrap(), (0..50).collect::<Vec<_>>());
    assert_eq!(name.as_deref(), Some("rxkit.test.serial"));
  }

  #[test]
  fn delayed_task_runs_after_ready_ones() {
    let executor = SerialExecutor::new("rxkit.test.delay").unwrap();
    let order = Arc::new(Mutex::new(vec![]));
    let c_order = order.clone();
    executor.run_after(Duration::from_millis(10), move || {
      c_order.lock().unwrap().push("late")
    });
    let c_order = order.clone();
    executor.run_async(move || c_order.lock().unwrap().push("now"));

    thread::sleep(Duration::from_millis(50));
    executor.run_sync(|| ()).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["now", "late"]);
  }

  #[test]
  fn cancelled_delay_never_runs() {
    let executor = SerialExecutor::new("rxkit.test.cancel").unwrap();
    let hit = Arc::new(Mutex::new(false));
    let c_hit = hit.clone();
    let handle = executor
      .run_after(Duration::from_millis(10), move || *c_hit.lock().unwrap() = true);
    handle.unsubscribe();

    thread::sleep(Duration::from_millis(40));
    executor.run_sync(|| ()).unwrap();
    assert!(!*hit.lock().unwrap());
  }

  #[test]
  fn cancelled_delay_releases_executor_clone() {
    let executor = SerialExecutor::new("rxkit.test.release").unwrap();
    let c_executor = executor.clone();
    let handle = executor.run_after(Duration::from_secs(60), move || {
      c_executor.run_async(|| {});
    });
    assert_eq!(Arc::strong_count(&executor.0), 2);

    handle.unsubscribe();
    assert_eq!(executor.pending(), 0);
    assert_eq!(Arc::strong_count(&executor.0), 1);
  }
}
