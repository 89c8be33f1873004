use std::{mem, time::Duration};

use tracing::trace;

use crate::{
  executor::Executor,
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
};

/// Collects values into frames, flushed by count or by time, whichever
/// comes first. The timer restarts whenever a new frame opens. A timer
/// flush emits the frame even when it is empty, completion only flushes a
/// non-empty one.
#[derive(Clone)]
pub struct BufferOp<S, E> {
  source: S,
  time_span: Duration,
  count: usize,
  executor: E,
}

impl<S, E> BufferOp<S, E> {
  #[inline]
  pub(crate) fn new(source: S, time_span: Duration, count: usize, executor: E) -> Self {
    BufferOp { source, time_span, count: count.max(1), executor }
  }
}

struct BufferState<O, Item> {
  observer: O,
  frame: Vec<Item>,
  frame_id: u64,
}

type SharedState<O, Item> = MutArc<Option<BufferState<O, Item>>>;

impl<Item, Err, O, S, E> Observable<Vec<Item>, Err, O> for BufferOp<S, E>
where
  O: Observer<Vec<Item>, Err> + Send + 'static,
  S: Observable<Item, Err, BufferObserver<O, Item, E>>,
  S::Unsub: Send + 'static,
  Item: Send + 'static,
  E: Executor,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let subscription = MultiSubscription::default();
    let timer = SerialSubscription::default();
    subscription.append(timer.clone());
    let state = MutArc::own(Some(BufferState {
      observer,
      frame: Vec::with_capacity(self.count.min(64)),
      frame_id: 0,
    }));

    schedule_flush::<O, Item, Err, E>(
      state.clone(),
      timer.clone(),
      self.executor.clone(),
      self.time_span,
      0,
    );
    let unsub = self.source.actual_subscribe(BufferObserver {
      state,
      timer,
      executor: self.executor,
      time_span: self.time_span,
      count: self.count,
    });
    subscription.append(unsub);
    subscription
  }
}

impl<Item, Err, S, E> ObservableExt<Vec<Item>, Err> for BufferOp<S, E> where
  S: ObservableExt<Item, Err>
{
}

fn schedule_flush<O, Item, Err, E>(
  state: SharedState<O, Item>,
  timer: SerialSubscription,
  executor: E,
  time_span: Duration,
  frame_id: u64,
) where
  O: Observer<Vec<Item>, Err> + Send + 'static,
  Item: Send + 'static,
  E: Executor,
{
  let c_state = state.clone();
  let c_timer = timer.clone();
  let c_executor = executor.clone();
  let handle = executor.run_after(time_span, move || {
    let next_id = {
      let mut guard = state.rc_deref_mut();
      let Some(buffer) = guard.as_mut() else { return };
      if buffer.frame_id != frame_id {
        return;
      }
      buffer.frame_id += 1;
      let frame = mem::take(&mut buffer.frame);
      trace!(len = frame.len(), "buffer flushed by timer");
      buffer.observer.next(frame);
      buffer.frame_id
    };
    schedule_flush::<O, Item, Err, E>(state, c_timer, c_executor, time_span, next_id);
  });
  // A count flush or the timer thread may have opened a newer frame and
  // installed its timer already; the stale handle must not replace it.
  let guard = c_state.rc_deref();
  if guard.as_ref().map_or(false, |b| b.frame_id == frame_id) {
    timer.replace(handle);
  } else {
    drop(guard);
    handle.unsubscribe();
  }
}

pub struct BufferObserver<O, Item, E> {
  state: SharedState<O, Item>,
  timer: SerialSubscription,
  executor: E,
  time_span: Duration,
  count: usize,
}

impl<Item, Err, O, E> Observer<Item, Err> for BufferObserver<O, Item, E>
where
  O: Observer<Vec<Item>, Err> + Send + 'static,
  Item: Send + 'static,
  E: Executor,
{
  fn next(&mut self, value: Item) {
    let restart = {
      let mut guard = self.state.rc_deref_mut();
      let Some(buffer) = guard.as_mut() else { return };
      buffer.frame.push(value);
      if buffer.frame.len() >= self.count {
        buffer.frame_id += 1;
        let frame = mem::take(&mut buffer.frame);
        buffer.observer.next(frame);
        Some(buffer.frame_id)
      } else {
        None
      }
    };
    if let Some(frame_id) = restart {
      schedule_flush::<O, Item, Err, E>(
        self.state.clone(),
        self.timer.clone(),
        self.executor.clone(),
        self.time_span,
        frame_id,
      );
    }
  }

  fn error(self, err: Err) {
    let state = self.state.rc_deref_mut().take();
    self.timer.unsubscribe();
    if let Some(buffer) = state {
      buffer.observer.error(err);
    }
  }

  fn complete(self) {
    let state = self.state.rc_deref_mut().take();
    self.timer.unsubscribe();
    if let Some(mut buffer) = state {
      if !buffer.frame.is_empty() {
        buffer.observer.next(buffer.frame);
      }
      buffer.observer.complete();
    }
  }

  fn is_finished(&self) -> bool {
    self
      .state
      .rc_deref()
      .as_ref()
      .map_or(true, |b| b.observer.is_finished())
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
    time::Duration,
  };

  fn frames_of(
    executor: &VirtualTimeExecutor,
    time_span: Duration,
    count: usize,
  ) -> (PublishSubject<i32, Infallible>, Arc<Mutex<Vec<Vec<i32>>>>) {
    let subject = PublishSubject::<i32, Infallible>::new();
    let frames = Arc::new(Mutex::new(vec![]));
    let c_frames = frames.clone();
    subject
      .clone()
      .buffer(time_span, count, executor.clone())
      .subscribe(move |f| c_frames.lock().unwrap().push(f));
    (subject, frames)
  }

  #[test]
  fn count_trigger() {
    let executor = VirtualTimeExecutor::new();
    let (mut subject, frames) = frames_of(&executor, Duration::from_secs(60), 2);
    (1..=5).for_each(|v| subject.next(v));
    assert_eq!(*frames.lock().unwrap(), vec![vec![1, 2], vec![3, 4]]);
    subject.complete();
    assert_eq!(*frames.lock().unwrap(), vec![vec![1, 2], vec![3, 4], vec![5]]);
  }

  #[test]
  fn time_trigger() {
    let executor = VirtualTimeExecutor::new();
    let (mut subject, frames) = frames_of(&executor, Duration::from_millis(10), 100);
    subject.next(1);
    subject.next(2);
    executor.advance_by(Duration::from_millis(10));
    subject.next(3);
    executor.advance_by(Duration::from_millis(10));
    assert_eq!(*frames.lock().unwrap(), vec![vec![1, 2], vec![3]]);
  }

  #[test]
  fn empty_time_frames_are_emitted() {
    let executor = VirtualTimeExecutor::new();
    let (mut subject, frames) = frames_of(&executor, Duration::from_millis(10), 100);
    executor.advance_by(Duration::from_millis(35));
    assert_eq!(*frames.lock().unwrap(), vec![vec![], vec![], vec![]]);
    subject.next(1);
    executor.advance_by(Duration::from_millis(5));
    assert_eq!(*frames.lock().unwrap(), vec![vec![], vec![], vec![], vec![1]]);
  }

  #[test]
  fn completion_skips_empty_frame() {
    let executor = VirtualTimeExecutor::new();
    let (mut subject, frames) = frames_of(&executor, Duration::from_millis(10), 2);
    subject.next(1);
    subject.next(2);
    subject.complete();
    assert_eq!(*frames.lock().unwrap(), vec![vec![1, 2]]);
  }

  #[cfg(feature = "futures-scheduler")]
  #[test]
  fn time_trigger_survives_thread_pool_reschedules() {
    let executor = ThreadPoolExecutor::new().unwrap();
    let frames = Arc::new(Mutex::new(vec![]));
    let c_frames = frames.clone();
    let mut subject = PublishSubject::<i32, Infallible>::new();
    let subscription = subject
      .clone()
      .buffer(Duration::from_millis(1), 2, executor)
      .subscribe(move |f| c_frames.lock().unwrap().push(f));

    for v in 0..200 {
      subject.next(v);
    }
    let flushed = frames.lock().unwrap().len();
    std::thread::sleep(Duration::from_millis(50));
    // the time trigger keeps flushing after the count flushes stopped
    assert!(frames.lock().unwrap().len() > flushed);
    subscription.unsubscribe();
  }

  #[test]
  fn count_flush_restarts_timer() {
    let executor = VirtualTimeExecutor::new();
    let (mut subject, frames) = frames_of(&executor, Duration::from_millis(10), 2);
    executor.advance_by(Duration::from_millis(8));
    subject.next(1);
    subject.next(2);
    subject.next(3);
    // the frame holding 3 opened at 8ms, so it is due at 18ms, not 10ms
    executor.advance_by(Duration::from_millis(4));
    assert_eq!(*frames.lock().unwrap(), vec![vec![1, 2]]);
    executor.advance_by(Duration::from_millis(6));
    assert_eq!(*frames.lock().unwrap(), vec![vec![1, 2], vec![3]]);
  }

  #[test]
  fn unsubscribe_stops_timer() {
    let executor = VirtualTimeExecutor::new();
    let frames = Arc::new(Mutex::new(vec![]));
    let c_frames = frames.clone();
    let mut subject = PublishSubject::<i32, Infallible>::new();
    let subscription = subject
      .clone()
      .buffer(Duration::from_millis(10), 10, executor.clone())
      .subscribe(move |f| c_frames.lock().unwrap().push(f));

    subject.next(1);
    subscription.unsubscribe();
    executor.advance_by(Duration::from_millis(50));
    assert!(frames.lock().unwrap().is_empty());
    assert_eq!(subject.observer_count(), 0);
  }
}
