use std::{
  cmp::Ordering,
  collections::{BinaryHeap, VecDeque},
  sync::{Condvar, Mutex, MutexGuard, PoisonError},
  time::{Duration, Instant},
};

use super::TaskHandle;

pub(crate) type Job = Box<dyn FnOnce() + Send>;

/// A job waiting for its due time. Ordered so that a `BinaryHeap` pops the
/// earliest due time first and, among equal due times, the one scheduled
/// first.
pub(crate) struct Timed<K> {
  pub(crate) due: K,
  pub(crate) seq: u64,
  pub(crate) handle: TaskHandle,
  pub(crate) job: Job,
}

impl<K: Ord> PartialEq for Timed<K> {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.seq == other.seq }
}

impl<K: Ord> Eq for Timed<K> {}

impl<K: Ord> PartialOrd for Timed<K> {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl<K: Ord> Ord for Timed<K> {
  fn cmp(&self, other: &Self) -> Ordering {
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.seq.cmp(&self.seq))
  }
}

#[derive(Default)]
struct QueueState {
  ready: VecDeque<Job>,
  delayed: BinaryHeap<Timed<Instant>>,
  seq: u64,
  closed: bool,
}

impl QueueState {
  fn promote_due(&mut self, now: Instant) {
    while self.delayed.peek().map_or(false, |t| t.due <= now) {
      if let Some(timed) = self.delayed.pop() {
        if !timed.handle.is_cancelled() {
          self.ready.push_back(timed.job);
        }
      }
    }
  }

  // Cancelled timers would otherwise keep their captures, executor clones
  // included, alive until their due time.
  fn prune_cancelled(&mut self) { self.delayed.retain(|t| !t.handle.is_cancelled()); }
}

/// FIFO work queue with delayed entries, shared by the serial executor's
/// worker thread and the main queue.
#[derive(Default)]
pub(crate) struct TaskQueue {
  state: Mutex<QueueState>,
  signal: Condvar,
}

impl TaskQueue {
  fn lock(&self) -> MutexGuard<'_, QueueState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub(crate) fn push(&self, job: Job) {
    let mut state = self.lock();
    if state.closed {
      return;
    }
    state.ready.push_back(job);
    drop(state);
    self.signal.notify_all();
  }

  pub(crate) fn push_after(&self, delay: Duration, handle: TaskHandle, job: Job) {
    let mut state = self.lock();
    if state.closed {
      return;
    }
    state.prune_cancelled();
    let seq = state.seq;
    state.seq += 1;
    state
      .delayed
      .push(Timed { due: Instant::now() + delay, seq, handle, job });
    drop(state);
    self.signal.notify_all();
  }

  /// Pops the next runnable job without waiting.
  pub(crate) fn try_pop(&self) -> Option<Job> {
    let mut state = self.lock();
    state.promote_due(Instant::now());
    state.ready.pop_front()
  }

  /// Blocks until a job is runnable. Returns `None` once the queue is closed
  /// and its ready jobs are drained; delayed jobs of a closed queue are
  /// dropped.
  pub(crate) fn pop_blocking(&self) -> Option<Job> {
    let mut state = self.lock();
    loop {
      state.prune_cancelled();
      state.promote_due(Instant::now());
      if let Some(job) = state.ready.pop_front() {
        return Some(job);
      }
      if state.closed {
        state.delayed.clear();
        return None;
      }
      state = match state.delayed.peek().map(|t| t.due) {
        Some(due) => {
          let timeout = due.saturating_duration_since(Instant::now());
          self
            .signal
            .wait_timeout(state, timeout)
            .unwrap_or_else(PoisonError::into_inner)
            .0
        }
        None => self
          .signal
          .wait(state)
          .unwrap_or_else(PoisonError::into_inner),
      };
    }
  }

  /// Waits until a delayed job comes due or new work arrives. Returns
  /// `false` if nothing is left to wait for.
  pub(crate) fn wait_for_work(&self) -> bool {
    let state = self.lock();
    if !state.ready.is_empty() {
      return true;
    }
    match state.delayed.peek().map(|t| t.due) {
      Some(due) => {
        let timeout = due.saturating_duration_since(Instant::now());
        let _ = self
          .signal
          .wait_timeout(state, timeout)
          .unwrap_or_else(PoisonError::into_inner);
        true
      }
      None => false,
    }
  }

  /// Queued jobs, not counting delayed ones that were cancelled.
  pub(crate) fn len(&self) -> usize {
    let mut state = self.lock();
    state.prune_cancelled();
    state.ready.len() + state.delayed.len()
  }

  pub(crate) fn close(&self) {
    self.lock().closed = true;
    self.signal.notify_all();
  }
}
