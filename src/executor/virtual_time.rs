use std::{
  collections::BinaryHeap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use crate::error::RxError;

use super::{queue::Timed, Executor, TaskHandle};

#[derive(Default)]
struct VirtualState {
  now: Duration,
  seq: u64,
  tasks: BinaryHeap<Timed<Duration>>,
}

/// An executor driven by a virtual clock, for deterministic tests of timed
/// operators.
///
/// Nothing runs until the test calls [`advance_by`](Self::advance_by) or
/// [`run_pending`](Self::run_pending). Tasks run on the calling thread in
/// due-time order, ties broken by submission order, and the clock reads each
/// task's due time while it runs.
#[derive(Clone, Default)]
pub struct VirtualTimeExecutor(Arc<Mutex<VirtualState>>);

impl VirtualTimeExecutor {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, VirtualState> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Virtual time elapsed since the executor was created.
  pub fn now(&self) -> Duration { self.lock().now }

  /// Number of tasks that have not run yet, cancelled ones included.
  pub fn pending(&self) -> usize { self.lock().tasks.len() }

  /// Runs every task due at the current virtual time.
  pub fn run_pending(&self) -> usize { self.advance_by(Duration::ZERO) }

  /// Moves the clock forward by `delta`, running every task that comes due
  /// on the way, including tasks scheduled by those tasks. Returns how many
  /// ran.
  pub fn advance_by(&self, delta: Duration) -> usize {
    let target = self.now() + delta;
    let mut count = 0;
    loop {
      let job = {
        let mut state = self.lock();
        let due = state.tasks.peek().map_or(false, |t| t.due <= target);
        let task = if due { state.tasks.pop() } else { None };
        match task {
          Some(task) => {
            state.now = state.now.max(task.due);
            Some(task.job)
          }
          None => {
            state.now = state.now.max(target);
            None
          }
        }
      };
      match job {
        Some(job) => {
          job();
          count += 1;
        }
        None => return count,
      }
    }
  }

  fn schedule(&self, delay: Duration, handle: TaskHandle, job: impl FnOnce() + Send + 'static) {
    let mut state = self.lock();
    let due = state.now + delay;
    let seq = state.seq;
    state.seq += 1;
    state.tasks.push(Timed { due, seq, handle, job: Box::new(job) });
  }
}

impl Executor for VirtualTimeExecutor {
  fn run_async<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    self.run_after(Duration::ZERO, task)
  }

  fn run_after<F>(&self, delay: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    self.schedule(delay, handle.clone(), handle.guard(task));
    handle
  }

  /// Runs `task` inline; the virtual clock has no worker to block on.
  fn run_sync<F, R>(&self, task: F) -> Result<R, RxError>
  where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
  {
    Ok(task())
  }
}
