use std::collections::VecDeque;

use crate::{
  ops::map::MapOp,
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
  type_hint::TypeHint,
};

/// `flat_map` and `concat_map`: map every value to an observable, then
/// merge.
pub type FlatMapOp<S, F, Item, Inner> = MergeAllOp<MapOp<S, F, Item>, Inner>;

pub struct MergeAllOp<S, Inner> {
  source: S,
  concurrent: usize,
  _hint: TypeHint<Inner>,
}

impl<S: Clone, Inner> Clone for MergeAllOp<S, Inner> {
  fn clone(&self) -> Self {
    MergeAllOp {
      source: self.source.clone(),
      concurrent: self.concurrent,
      _hint: TypeHint::new(),
    }
  }
}

impl<S, Inner> MergeAllOp<S, Inner> {
  #[inline]
  pub(crate) fn new(source: S, concurrent: usize) -> Self {
    MergeAllOp { source, concurrent: concurrent.max(1), _hint: TypeHint::new() }
  }
}

impl<Item, Err, O, S, Inner> Observable<Item, Err, O> for MergeAllOp<S, Inner>
where
  O: Observer<Item, Err> + Send + 'static,
  S: Observable<Inner, Err, OuterObserver<O, Item>>,
  S::Unsub: Send + 'static,
  Inner: Observable<Item, Err, InnerObserver<O>> + Send + 'static,
  Inner::Unsub: Send + 'static,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let outer = OuterObserver::new(observer, self.concurrent);
    let subscription = outer.subscription.clone();
    let unsub = self.source.actual_subscribe(outer);
    subscription.append(unsub);
    subscription
  }
}

impl<Item, Err, S, Inner> ObservableExt<Item, Err> for MergeAllOp<S, Inner>
where
  S: ObservableExt<Inner, Err>,
  Inner: ObservableExt<Item, Err>,
{
}

type Subscribe = Box<dyn FnOnce() + Send>;

struct MergeState<O> {
  observer: O,
  waiting: VecDeque<Subscribe>,
  active: usize,
  concurrent: usize,
  outer_completed: bool,
}

type SharedState<O> = MutArc<Option<MergeState<O>>>;

/// Receives the inner observables. `merge` drives it directly, subscribing
/// every source at once and then finishing it.
pub struct OuterObserver<O, Item> {
  state: SharedState<O>,
  subscription: MultiSubscription,
  _hint: TypeHint<Item>,
}

impl<O, Item> OuterObserver<O, Item> {
  pub(crate) fn new(observer: O, concurrent: usize) -> Self {
    let state = MergeState {
      observer,
      waiting: VecDeque::new(),
      active: 0,
      concurrent,
      outer_completed: false,
    };
    OuterObserver {
      state: MutArc::own(Some(state)),
      subscription: MultiSubscription::default(),
      _hint: TypeHint::new(),
    }
  }

  pub(crate) fn subscription(&self) -> &MultiSubscription { &self.subscription }

  /// Subscribes `source` right away, ignoring the concurrency limit.
  pub(crate) fn subscribe_now<Err, Inner>(&self, source: Inner)
  where
    O: Observer<Item, Err>,
    Inner: Observable<Item, Err, InnerObserver<O>>,
    Inner::Unsub: Send + 'static,
  {
    match self.state.rc_deref_mut().as_mut() {
      Some(state) => state.active += 1,
      None => return,
    }
    subscribe_inner(source, self.state.clone(), self.subscription.clone());
  }

  /// No more inner observables will arrive; completes once the active ones
  /// are done.
  pub(crate) fn finish<Err>(self)
  where
    O: Observer<Item, Err>,
  {
    let mut guard = self.state.rc_deref_mut();
    let done = match guard.as_mut() {
      Some(state) => {
        state.outer_completed = true;
        state.active == 0 && state.waiting.is_empty()
      }
      None => false,
    };
    let state = if done { guard.take() } else { None };
    drop(guard);
    if let Some(state) = state {
      state.observer.complete();
    }
  }

  pub(crate) fn finished<Err>(&self) -> bool
  where
    O: Observer<Item, Err>,
  {
    self
      .state
      .rc_deref()
      .as_ref()
      .map_or(true, |s| s.observer.is_finished())
  }
}

fn subscribe_inner<Item, Err, O, Inner>(
  inner: Inner,
  state: SharedState<O>,
  subscription: MultiSubscription,
) where
  O: Observer<Item, Err>,
  Inner: Observable<Item, Err, InnerObserver<O>>,
  Inner::Unsub: Send + 'static,
{
  let unsub = inner.actual_subscribe(InnerObserver {
    state,
    subscription: subscription.clone(),
  });
  subscription.append(unsub);
}

impl<Item, Err, O, Inner> Observer<Inner, Err> for OuterObserver<O, Item>
where
  O: Observer<Item, Err> + Send + 'static,
  Inner: Observable<Item, Err, InnerObserver<O>> + Send + 'static,
  Inner::Unsub: Send + 'static,
{
  fn next(&mut self, inner: Inner) {
    let mut guard = self.state.rc_deref_mut();
    let Some(state) = guard.as_mut() else { return };
    if state.active < state.concurrent {
      state.active += 1;
      drop(guard);
      subscribe_inner(inner, self.state.clone(), self.subscription.clone());
    } else {
      let c_state = self.state.clone();
      let subscription = self.subscription.clone();
      state
        .waiting
        .push_back(Box::new(move || subscribe_inner(inner, c_state, subscription)));
    }
  }

  fn error(self, err: Err) {
    let state = self.state.rc_deref_mut().take();
    if let Some(state) = state {
      state.observer.error(err);
    }
    self.subscription.unsubscribe();
  }

  #[inline]
  fn complete(self) { self.finish::<Err>() }

  #[inline]
  fn is_finished(&self) -> bool { self.finished::<Err>() }
}

pub struct InnerObserver<O> {
  state: SharedState<O>,
  subscription: MultiSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for InnerObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.subscription.is_closed() {
      return;
    }
    if let Some(state) = self.state.rc_deref_mut().as_mut() {
      state.observer.next(value);
    }
  }

  fn error(self, err: Err) {
    let state = self.state.rc_deref_mut().take();
    if let Some(state) = state {
      state.observer.error(err);
    }
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    let mut guard = self.state.rc_deref_mut();
    let Some(state) = guard.as_mut() else { return };
    if let Some(next_inner) = state.waiting.pop_front() {
      // the freed slot goes to the oldest waiting inner, outside the lock
      drop(guard);
      next_inner();
    } else {
      state.active -= 1;
      if state.active == 0 && state.outer_completed {
        let state = guard.take();
        drop(guard);
        if let Some(state) = state {
          state.observer.complete();
        }
      }
    }
  }

  fn is_finished(&self) -> bool {
    self
      .state
      .rc_deref()
      .as_ref()
      .map_or(true, |s| s.observer.is_finished())
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

  fn collect_into<T: Send + 'static>(
    values: &Arc<Mutex<Vec<T>>>,
  ) -> impl FnMut(T) + Send + 'static {
    let values = values.clone();
    move |v| values.lock().unwrap().push(v)
  }

  #[test]
  fn smoke() {
    let executor = VirtualTimeExecutor::new();
    let values = Arc::new(Mutex::new(vec![]));
    let c_executor = executor.clone();

    observable::from_iter(
      (0..3).map(move |_| observable::interval(Duration::from_millis(1), c_executor.clone()).take(5)),
    )
    .merge_all(2)
    .subscribe(collect_into(&values));
    executor.advance_by(Duration::from_millis(11));

    assert_eq!(
      *values.lock().unwrap(),
      vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 0, 1, 2, 3, 4]
    );
  }

  #[test]
  fn inner_release_on_unsubscribe() {
    let values = Arc::new(Mutex::new(vec![]));
    let mut subject = PublishSubject::<i32, Infallible>::new();

    let subscription = observable::of([subject.clone()])
      .merge_all(1)
      .subscribe(collect_into(&values));
    assert_eq!(subject.observer_count(), 1);
    subscription.unsubscribe();
    assert_eq!(subject.observer_count(), 0);

    subject.next(1);
    assert!(values.lock().unwrap().is_empty());
  }

  #[test]
  fn concat_all_runs_one_at_a_time() {
    let executor = VirtualTimeExecutor::new();
    let ticks = Arc::new(Mutex::new(vec![]));
    let c_executor = executor.clone();

    observable::interval(Duration::from_millis(100), executor.clone())
      .take(2)
      .map(move |_| observable::interval(Duration::from_millis(30), c_executor.clone()).take(5))
      .concat_all()
      .subscribe(collect_into(&ticks));
    executor.advance_by(Duration::from_millis(1000));

    assert_eq!(*ticks.lock().unwrap(), vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4]);
  }

  #[test]
  fn merge_all_interleaves() {
    let executor = VirtualTimeExecutor::new();
    let ticks = Arc::new(Mutex::new(vec![]));
    let c_executor = executor.clone();

    observable::interval(Duration::from_millis(100), executor.clone())
      .take(2)
      .map(move |_| observable::interval(Duration::from_millis(30), c_executor.clone()).take(5))
      .merge_all(usize::MAX)
      .subscribe(collect_into(&ticks));
    executor.advance_by(Duration::from_millis(1000));

    assert_eq!(*ticks.lock().unwrap(), vec![0, 1, 2, 3, 0, 4, 1, 2, 3, 4]);
  }

  #[test]
  fn flat_map_completes_after_every_inner() {
    let values = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));
    let c_completed = completed.clone();

    observable::of([1, 2, 3])
      .flat_map(|v| observable::of([v * 10, v * 10 + 1]))
      .on_complete(move || *c_completed.lock().unwrap() = true)
      .subscribe(collect_into(&values));

    assert_eq!(*values.lock().unwrap(), vec![10, 11, 20, 21, 30, 31]);
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn inner_error_stops_everything() {
    let error = Arc::new(Mutex::new(None));
    let values = Arc::new(Mutex::new(vec![]));
    let (c_error, c_values) = (error.clone(), values.clone());
    let mut first = PublishSubject::<i32, &'static str>::new();
    let second = PublishSubject::<i32, &'static str>::new();

    observable::of([first.clone(), second.clone()])
      .map_err(|e: Infallible| -> &'static str { match e {} })
      .merge_all(usize::MAX)
      .subscribe_all(
        move |v| c_values.lock().unwrap().push(v),
        move |e| *c_error.lock().unwrap() = Some(e),
        || {},
      );

    first.next(1);
    second.error("bad");
    first.next(2);

    assert_eq!(*values.lock().unwrap(), vec![1]);
    assert_eq!(*error.lock().unwrap(), Some("bad"));
    assert_eq!(first.observer_count(), 0);
  }
}
