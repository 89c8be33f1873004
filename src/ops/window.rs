use std::{mem, time::Duration};

use tracing::trace;

use crate::{
  executor::Executor,
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
};

/// Splits the source into windows closed by count or by time, whichever
/// comes first. A window is emitted for every frame, empty ones included;
/// the first one opens on subscribe.
#[derive(Clone)]
pub struct WindowOp<S, E> {
  source: S,
  time_span: Duration,
  count: usize,
  executor: E,
}

impl<S, E> WindowOp<S, E> {
  #[inline]
  pub(crate) fn new(source: S, time_span: Duration, count: usize, executor: E) -> Self {
    WindowOp { source, time_span, count: count.max(1), executor }
  }
}

/// One window of a [`WindowOp`]. It is hot: subscribe while handling the
/// window, values pushed before that are not replayed.
pub struct WindowObservable<Item, Err>(PublishSubject<Item, Err>);

impl<Item, Err> Clone for WindowObservable<Item, Err> {
  fn clone(&self) -> Self { WindowObservable(self.0.clone()) }
}

impl<Item, Err, O> Observable<Item, Err, O> for WindowObservable<Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  type Unsub = SubjectSubscription<Item, Err, Publish>;

  #[inline]
  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.0.actual_subscribe(observer) }
}

impl<Item, Err> ObservableExt<Item, Err> for WindowObservable<Item, Err> {}

struct WindowState<O, Item, Err> {
  observer: O,
  window: PublishSubject<Item, Err>,
  received: usize,
  frame_id: u64,
}

impl<O, Item, Err> WindowState<O, Item, Err>
where
  O: Observer<WindowObservable<Item, Err>, Err>,
  Item: Clone,
  Err: Clone,
{
  fn rotate(&mut self) -> u64 {
    let closed = mem::take(&mut self.window);
    self.received = 0;
    self.frame_id += 1;
    closed.complete();
    self.observer.next(WindowObservable(self.window.clone()));
    self.frame_id
  }
}

type SharedState<O, Item, Err> = MutArc<Option<WindowState<O, Item, Err>>>;

impl<Item, Err, O, S, E> Observable<WindowObservable<Item, Err>, Err, O> for WindowOp<S, E>
where
  O: Observer<WindowObservable<Item, Err>, Err> + Send + 'static,
  S: Observable<Item, Err, WindowObserver<O, Item, Err, E>>,
  S::Unsub: Send + 'static,
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  E: Executor,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    let subscription = MultiSubscription::default();
    let timer = SerialSubscription::default();
    subscription.append(timer.clone());

    let window = PublishSubject::new();
    observer.next(WindowObservable(window.clone()));
    let state = MutArc::own(Some(WindowState { observer, window, received: 0, frame_id: 0 }));

    schedule_rotate::<O, Item, Err, E>(
      state.clone(),
      timer.clone(),
      self.executor.clone(),
      self.time_span,
      0,
    );
    let unsub = self.source.actual_subscribe(WindowObserver {
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

impl<Item, Err, S, E> ObservableExt<WindowObservable<Item, Err>, Err> for WindowOp<S, E> where
  S: ObservableExt<Item, Err>
{
}

fn schedule_rotate<O, Item, Err, E>(
  state: SharedState<O, Item, Err>,
  timer: SerialSubscription,
  executor: E,
  time_span: Duration,
  frame_id: u64,
) where
  O: Observer<WindowObservable<Item, Err>, Err> + Send + 'static,
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  E: Executor,
{
  let c_state = state.clone();
  let c_timer = timer.clone();
  let c_executor = executor.clone();
  let handle = executor.run_after(time_span, move || {
    let next_id = {
      let mut guard = state.rc_deref_mut();
      let Some(window) = guard.as_mut() else { return };
      if window.frame_id != frame_id {
        return;
      }
      trace!(received = window.received, "window closed by timer");
      window.rotate()
    };
    schedule_rotate::<O, Item, Err, E>(state, c_timer, c_executor, time_span, next_id);
  });
  // Only the timer of the current window may sit in the slot.
  let guard = c_state.rc_deref();
  if guard.as_ref().map_or(false, |w| w.frame_id == frame_id) {
    timer.replace(handle);
  } else {
    drop(guard);
    handle.unsubscribe();
  }
}

pub struct WindowObserver<O, Item, Err, E> {
  state: SharedState<O, Item, Err>,
  timer: SerialSubscription,
  executor: E,
  time_span: Duration,
  count: usize,
}

impl<Item, Err, O, E> Observer<Item, Err> for WindowObserver<O, Item, Err, E>
where
  O: Observer<WindowObservable<Item, Err>, Err> + Send + 'static,
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  E: Executor,
{
  fn next(&mut self, value: Item) {
    let restart = {
      let mut guard = self.state.rc_deref_mut();
      let Some(window) = guard.as_mut() else { return };
      window.window.next(value);
      window.received += 1;
      (window.received >= self.count).then(|| window.rotate())
    };
    if let Some(frame_id) = restart {
      schedule_rotate::<O, Item, Err, E>(
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
    if let Some(window) = state {
      window.window.error(err.clone());
      window.observer.error(err);
    }
  }

  fn complete(self) {
    let state = self.state.rc_deref_mut().take();
    self.timer.unsubscribe();
    if let Some(window) = state {
      window.window.complete();
      window.observer.complete();
    }
  }

  fn is_finished(&self) -> bool {
    self
      .state
      .rc_deref()
      .as_ref()
      .map_or(true, |w| w.observer.is_finished())
  }
}
