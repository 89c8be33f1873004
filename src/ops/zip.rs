use std::collections::VecDeque;

use crate::{
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
};

/// Pairs values from two observables by arrival index. Each side buffers
/// values the other side has not matched yet.
#[derive(Clone)]
pub struct ZipOp<A, B> {
  source_a: A,
  source_b: B,
}

impl<A, B> ZipOp<A, B> {
  #[inline]
  pub(crate) fn new(source_a: A, source_b: B) -> Self { ZipOp { source_a, source_b } }
}

pub struct ZipState<O, ItemA, ItemB> {
  observer: Option<O>,
  buffer_a: VecDeque<ItemA>,
  buffer_b: VecDeque<ItemB>,
  completed_a: bool,
  completed_b: bool,
}

impl<O, ItemA, ItemB> ZipState<O, ItemA, ItemB> {
  /// A side that completed with nothing buffered can never pair again.
  fn exhausted(&self) -> bool {
    (self.completed_a && self.buffer_a.is_empty())
      || (self.completed_b && self.buffer_b.is_empty())
  }
}

type SharedState<O, ItemA, ItemB> = MutArc<ZipState<O, ItemA, ItemB>>;

fn finish<O, ItemA, ItemB, Err>(
  state: &SharedState<O, ItemA, ItemB>,
  subscription: &MultiSubscription,
) where
  O: Observer<(ItemA, ItemB), Err>,
{
  let observer = {
    let mut state = state.rc_deref_mut();
    if state.exhausted() { state.observer.take() } else { None }
  };
  if let Some(observer) = observer {
    observer.complete();
    subscription.clone().unsubscribe();
  }
}

fn fail<O, ItemA, ItemB, Err>(
  state: &SharedState<O, ItemA, ItemB>,
  subscription: &MultiSubscription,
  err: Err,
) where
  O: Observer<(ItemA, ItemB), Err>,
{
  let observer = state.rc_deref_mut().observer.take();
  if let Some(observer) = observer {
    observer.error(err);
  }
  subscription.clone().unsubscribe();
}

impl<ItemA, ItemB, Err, O, A, B> Observable<(ItemA, ItemB), Err, O> for ZipOp<A, B>
where
  O: Observer<(ItemA, ItemB), Err>,
  A: Observable<ItemA, Err, ZipAObserver<O, ItemA, ItemB>>,
  A::Unsub: Send + 'static,
  B: Observable<ItemB, Err, ZipBObserver<O, ItemA, ItemB>>,
  B::Unsub: Send + 'static,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let subscription = MultiSubscription::default();
    let state = MutArc::own(ZipState {
      observer: Some(observer),
      buffer_a: VecDeque::new(),
      buffer_b: VecDeque::new(),
      completed_a: false,
      completed_b: false,
    });

    let unsub = self.source_a.actual_subscribe(ZipAObserver {
      state: state.clone(),
      subscription: subscription.clone(),
    });
    subscription.append(unsub);
    let unsub = self.source_b.actual_subscribe(ZipBObserver {
      state,
      subscription: subscription.clone(),
    });
    subscription.append(unsub);
    subscription
  }
}

impl<ItemA, ItemB, Err, A, B> ObservableExt<(ItemA, ItemB), Err> for ZipOp<A, B>
where
  A: ObservableExt<ItemA, Err>,
  B: ObservableExt<ItemB, Err>,
{
}

pub struct ZipAObserver<O, ItemA, ItemB> {
  state: SharedState<O, ItemA, ItemB>,
  subscription: MultiSubscription,
}

pub struct ZipBObserver<O, ItemA, ItemB> {
  state: SharedState<O, ItemA, ItemB>,
  subscription: MultiSubscription,
}

impl<ItemA, ItemB, Err, O> Observer<ItemA, Err> for ZipAObserver<O, ItemA, ItemB>
where
  O: Observer<(ItemA, ItemB), Err>,
{
  fn next(&mut self, value: ItemA) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.observer.is_none() || self.subscription.is_closed() {
        return;
      }
      match state.buffer_b.pop_front() {
        Some(b) => {
          if let Some(observer) = state.observer.as_mut() {
            observer.next((value, b));
          }
        }
        None => state.buffer_a.push_back(value),
      }
    }
    finish::<O, ItemA, ItemB, Err>(&self.state, &self.subscription);
  }

  fn error(self, err: Err) { fail(&self.state, &self.subscription, err) }

  fn complete(self) {
    self.state.rc_deref_mut().completed_a = true;
    finish::<O, ItemA, ItemB, Err>(&self.state, &self.subscription);
  }

  fn is_finished(&self) -> bool {
    self.state.rc_deref().observer.as_ref().map_or(true, |o| o.is_finished())
  }
}

impl<ItemA, ItemB, Err, O> Observer<ItemB, Err> for ZipBObserver<O, ItemA, ItemB>
where
  O: Observer<(ItemA, ItemB), Err>,
{
  fn next(&mut self, value: ItemB) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.observer.is_none() || self.subscription.is_closed() {
        return;
      }
      match state.buffer_a.pop_front() {
        Some(a) => {
          if let Some(observer) = state.observer.as_mut() {
            observer.next((a, value));
          }
        }
        None => state.buffer_b.push_back(value),
      }
    }
    finish::<O, ItemA, ItemB, Err>(&self.state, &self.subscription);
  }

  fn error(self, err: Err) { fail(&self.state, &self.subscription, err) }

  fn complete(self) {
    self.state.rc_deref_mut().completed_b = true;
    finish::<O, ItemA, ItemB, Err>(&self.state, &self.subscription);
  }

  fn is_finished(&self) -> bool {
    self.state.rc_deref().observer.as_ref().map_or(true, |o| o.is_finished())
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
  };

  #[test]
  fn zip_basic() {
    let mut result = vec![];
    observable::from_iter([1, 2, 3])
      .zip(observable::from_iter([4, 5, 6]))
      .subscribe(|v| result.push(v));
    assert_eq!(result, vec![(1, 4), (2, 5), (3, 6)]);
  }

  #[test]
  fn zip_different_lengths() {
    let mut result = vec![];
    let mut completed = false;
    observable::from_iter([1, 2, 3, 4, 5])
      .zip(observable::from_iter([10, 20, 30]))
      .on_complete(|| completed = true)
      .subscribe(|v| result.push(v));

    assert_eq!(result, vec![(1, 10), (2, 20), (3, 30)]);
    assert!(completed);
  }

  #[test]
  fn completes_once_short_side_is_drained() {
    let values = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));
    let (c_values, c_completed) = (values.clone(), completed.clone());
    let mut letters = PublishSubject::<char, Infallible>::new();
    let mut numbers = PublishSubject::<i32, Infallible>::new();

    letters
      .clone()
      .zip(numbers.clone())
      .on_complete(move || *c_completed.lock().unwrap() = true)
      .subscribe(move |v| c_values.lock().unwrap().push(v));

    letters.next('a');
    letters.next('b');
    letters.complete();
    assert!(!*completed.lock().unwrap());
    numbers.next(1);
    numbers.next(2);

    assert_eq!(*values.lock().unwrap(), vec![('a', 1), ('b', 2)]);
    assert!(*completed.lock().unwrap());
    assert_eq!(numbers.observer_count(), 0);
  }

  #[test]
  fn error_from_either_side() {
    let error = Arc::new(Mutex::new(None));
    let c_error = error.clone();
    let a = PublishSubject::<i32, &'static str>::new();
    let b = PublishSubject::<i32, &'static str>::new();

    a.clone().zip(b.clone()).subscribe_all(
      |_| {},
      move |e| *c_error.lock().unwrap() = Some(e),
      || {},
    );
    b.error("oops");

    assert_eq!(*error.lock().unwrap(), Some("oops"));
    assert_eq!(a.observer_count(), 0);
  }

  #[test]
  fn unsubscribe_releases_both_sources() {
    let values = Arc::new(Mutex::new(vec![]));
    let c_values = values.clone();
    let mut letters = PublishSubject::<char, Infallible>::new();
    let mut numbers = PublishSubject::<i32, Infallible>::new();

    let subscription = letters
      .clone()
      .zip(numbers.clone())
      .subscribe(move |v| c_values.lock().unwrap().push(v));
    letters.next('a');

    subscription.unsubscribe();
    assert_eq!(letters.observer_count(), 0);
    assert_eq!(numbers.observer_count(), 0);
    numbers.next(1);
    letters.next('b');
    numbers.next(2);
    assert!(values.lock().unwrap().is_empty());
  }
}
