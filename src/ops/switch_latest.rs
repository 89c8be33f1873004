use crate::{
  ops::map::MapOp,
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
  type_hint::TypeHint,
};

/// `flat_map_latest`: map every value to an observable, then switch.
pub type FlatMapLatestOp<S, F, Item, Inner> = SwitchLatestOp<MapOp<S, F, Item>, Inner>;

pub struct SwitchLatestOp<S, Inner> {
  source: S,
  _hint: TypeHint<Inner>,
}

impl<S: Clone, Inner> Clone for SwitchLatestOp<S, Inner> {
  fn clone(&self) -> Self {
    SwitchLatestOp { source: self.source.clone(), _hint: TypeHint::new() }
  }
}

impl<S, Inner> SwitchLatestOp<S, Inner> {
  #[inline]
  pub(crate) fn new(source: S) -> Self { SwitchLatestOp { source, _hint: TypeHint::new() } }
}

struct SwitchState<O> {
  observer: O,
  generation: u64,
  inner_active: bool,
  outer_completed: bool,
}

type SharedState<O> = MutArc<Option<SwitchState<O>>>;

impl<Item, Err, O, S, Inner> Observable<Item, Err, O> for SwitchLatestOp<S, Inner>
where
  O: Observer<Item, Err> + Send + 'static,
  S: Observable<Inner, Err, SwitchOuterObserver<O, Item>>,
  S::Unsub: Send + 'static,
  Inner: Observable<Item, Err, SwitchInnerObserver<O>>,
  Inner::Unsub: Send + 'static,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let subscription = MultiSubscription::default();
    let current = SerialSubscription::default();
    subscription.append(current.clone());
    let outer = SwitchOuterObserver {
      state: MutArc::own(Some(SwitchState {
        observer,
        generation: 0,
        inner_active: false,
        outer_completed: false,
      })),
      current,
      subscription: subscription.clone(),
      _hint: TypeHint::new(),
    };
    let unsub = self.source.actual_subscribe(outer);
    subscription.append(unsub);
    subscription
  }
}

impl<Item, Err, S, Inner> ObservableExt<Item, Err> for SwitchLatestOp<S, Inner>
where
  S: ObservableExt<Inner, Err>,
  Inner: ObservableExt<Item, Err>,
{
}

pub struct SwitchOuterObserver<O, Item> {
  state: SharedState<O>,
  current: SerialSubscription,
  subscription: MultiSubscription,
  _hint: TypeHint<Item>,
}

impl<Item, Err, O, Inner> Observer<Inner, Err> for SwitchOuterObserver<O, Item>
where
  O: Observer<Item, Err>,
  Inner: Observable<Item, Err, SwitchInnerObserver<O>>,
  Inner::Unsub: Send + 'static,
{
  fn next(&mut self, inner: Inner) {
    let generation = {
      let mut guard = self.state.rc_deref_mut();
      let Some(state) = guard.as_mut() else { return };
      state.generation += 1;
      state.inner_active = true;
      state.generation
    };
    // the previous inner is gone before the next one starts
    self.current.clear();
    let unsub = inner.actual_subscribe(SwitchInnerObserver {
      state: self.state.clone(),
      generation,
      subscription: self.subscription.clone(),
    });
    self.current.replace(unsub);
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
    let done = match guard.as_mut() {
      Some(state) => {
        state.outer_completed = true;
        !state.inner_active
      }
      None => false,
    };
    let state = if done { guard.take() } else { None };
    drop(guard);
    if let Some(state) = state {
      state.observer.complete();
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

pub struct SwitchInnerObserver<O> {
  state: SharedState<O>,
  generation: u64,
  subscription: MultiSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for SwitchInnerObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.subscription.is_closed() {
      return;
    }
    if let Some(state) = self.state.rc_deref_mut().as_mut() {
      if state.generation == self.generation {
        state.observer.next(value);
      }
    }
  }

  fn error(self, err: Err) {
    let state = {
      let mut guard = self.state.rc_deref_mut();
      let current = guard.as_ref().map_or(false, |s| s.generation == self.generation);
      if current { guard.take() } else { None }
    };
    if let Some(state) = state {
      state.observer.error(err);
      self.subscription.unsubscribe();
    }
  }

  fn complete(self) {
    let state = {
      let mut guard = self.state.rc_deref_mut();
      let done = match guard.as_mut() {
        Some(state) if state.generation == self.generation => {
          state.inner_active = false;
          state.outer_completed
        }
        _ => false,
      };
      if done { guard.take() } else { None }
    };
    if let Some(state) = state {
      state.observer.complete();
    }
  }

  fn is_finished(&self) -> bool {
    self.state.rc_deref().as_ref().map_or(true, |s| {
      s.generation != self.generation || s.observer.is_finished()
    })
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

  #[test]
  fn mirrors_only_latest_inner() {
    let values = Arc::new(Mutex::new(vec![]));
    let c_values = values.clone();
    let mut outer = PublishSubject::<PublishSubject<i32, Infallible>, Infallible>::new();
    let mut first = PublishSubject::<i32, Infallible>::new();
    let mut second = PublishSubject::<i32, Infallible>::new();

    outer
      .clone()
      .switch_latest()
      .subscribe(move |v| c_values.lock().unwrap().push(v));

    outer.next(first.clone());
    first.next(1);
    outer.next(second.clone());
    assert_eq!(first.observer_count(), 0);
    first.next(2);
    second.next(3);

    assert_eq!(*values.lock().unwrap(), vec![1, 3]);
  }

  #[test]
  fn completes_when_outer_and_latest_inner_complete() {
    let completed = Arc::new(Mutex::new(false));
    let c_completed = completed.clone();
    let mut outer = PublishSubject::<PublishSubject<i32, Infallible>, Infallible>::new();
    let inner = PublishSubject::<i32, Infallible>::new();

    outer
      .clone()
      .switch_latest()
      .on_complete(move || *c_completed.lock().unwrap() = true)
      .subscribe(|_| {});

    outer.next(inner.clone());
    outer.complete();
    assert!(!*completed.lock().unwrap());
    inner.complete();
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn flat_map_latest_drops_stale_timers() {
    let executor = VirtualTimeExecutor::new();
    let values = Arc::new(Mutex::new(vec![]));
    let c_values = values.clone();
    let c_executor = executor.clone();

    observable::interval(Duration::from_millis(10), executor.clone())
      .take(3)
      .flat_map_latest(move |v| {
        observable::timer(v, Duration::from_millis(15), c_executor.clone())
      })
      .subscribe(move |v| c_values.lock().unwrap().push(v));
    executor.advance_by(Duration::from_millis(100));

    // only the last tick lives long enough for its timer to fire
    assert_eq!(*values.lock().unwrap(), vec![2]);
  }
}
