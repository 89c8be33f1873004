use std::collections::VecDeque;

use crate::{
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
};

/// Zips any number of sources of the same type. Emits a `Vec` holding one
/// value from every source, in source order, each time all of them have an
/// unmatched value. Completes once a completed source has nothing left to
/// pair; no sources at all complete at once.
///
/// ```
/// use rxkit::prelude::*;
///
/// observable::zip([observable::of([1, 2]), observable::of([3, 4]), observable::of([5, 6])])
///   .subscribe(|row| println!("{:?}", row));
/// ```
pub fn zip<I>(sources: I) -> ZipSources<I>
where
  I: IntoIterator,
{
  ZipSources(sources)
}

/// Combines the latest value of any number of sources of the same type.
/// Nothing is emitted until every source produced a value; from then on
/// every value emits a `Vec` of the latest ones, in source order. Completes
/// after all sources completed.
pub fn combine_latest<I>(sources: I) -> CombineLatestSources<I>
where
  I: IntoIterator,
{
  CombineLatestSources(sources)
}

#[derive(Clone)]
pub struct ZipSources<I>(I);

#[derive(Clone)]
pub struct CombineLatestSources<I>(I);

pub struct ZipSourcesState<O, Item> {
  observer: Option<O>,
  queues: Vec<VecDeque<Item>>,
  completed: Vec<bool>,
}

impl<O, Item> ZipSourcesState<O, Item> {
  fn exhausted(&self) -> bool {
    self.queues.iter().zip(&self.completed).any(|(q, done)| *done && q.is_empty())
  }
}

pub struct ZipSourcesObserver<O, Item> {
  index: usize,
  state: MutArc<ZipSourcesState<O, Item>>,
  subscription: MultiSubscription,
}

impl<Item, Err, O, I> Observable<Vec<Item>, Err, O> for ZipSources<I>
where
  O: Observer<Vec<Item>, Err>,
  I: IntoIterator,
  I::Item: Observable<Item, Err, ZipSourcesObserver<O, Item>>,
  <I::Item as Observable<Item, Err, ZipSourcesObserver<O, Item>>>::Unsub: Send + 'static,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let sources: Vec<_> = self.0.into_iter().collect();
    let subscription = MultiSubscription::default();
    if sources.is_empty() {
      observer.complete();
      subscription.clone().unsubscribe();
      return subscription;
    }
    let state = MutArc::own(ZipSourcesState {
      observer: Some(observer),
      queues: sources.iter().map(|_| VecDeque::new()).collect(),
      completed: vec![false; sources.len()],
    });
    for (index, source) in sources.into_iter().enumerate() {
      if subscription.is_closed() {
        break;
      }
      let unsub = source.actual_subscribe(ZipSourcesObserver {
        index,
        state: state.clone(),
        subscription: subscription.clone(),
      });
      subscription.append(unsub);
    }
    subscription
  }
}

impl<Item, Err, I> ObservableExt<Vec<Item>, Err> for ZipSources<I>
where
  I: IntoIterator,
  I::Item: ObservableExt<Item, Err>,
{
}

impl<Item, Err, O> Observer<Item, Err> for ZipSourcesObserver<O, Item>
where
  O: Observer<Vec<Item>, Err>,
{
  fn next(&mut self, value: Item) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.observer.is_none() || self.subscription.is_closed() {
        return;
      }
      let Some(queue) = state.queues.get_mut(self.index) else { return };
      queue.push_back(value);
      if state.queues.iter().all(|q| !q.is_empty()) {
        let row: Vec<Item> = state.queues.iter_mut().filter_map(VecDeque::pop_front).collect();
        if let Some(observer) = state.observer.as_mut() {
          observer.next(row);
        }
      }
    }
    self.finish::<Err>();
  }

  fn error(self, err: Err) {
    let observer = self.state.rc_deref_mut().observer.take();
    if let Some(observer) = observer {
      observer.error(err);
    }
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    if let Some(done) = self.state.rc_deref_mut().completed.get_mut(self.index) {
      *done = true;
    }
    self.finish::<Err>();
  }

  fn is_finished(&self) -> bool {
    self.state.rc_deref().observer.as_ref().map_or(true, |o| o.is_finished())
  }
}

impl<O, Item> ZipSourcesObserver<O, Item> {
  fn finish<Err>(&self)
  where
    O: Observer<Vec<Item>, Err>,
  {
    let observer = {
      let mut state = self.state.rc_deref_mut();
      if state.exhausted() { state.observer.take() } else { None }
    };
    if let Some(observer) = observer {
      observer.complete();
      self.subscription.clone().unsubscribe();
    }
  }
}

pub struct CombineSourcesState<O, Item> {
  observer: Option<O>,
  latest: Vec<Option<Item>>,
  completed: usize,
}

pub struct CombineSourcesObserver<O, Item> {
  index: usize,
  state: MutArc<CombineSourcesState<O, Item>>,
  subscription: MultiSubscription,
}

impl<Item, Err, O, I> Observable<Vec<Item>, Err, O> for CombineLatestSources<I>
where
  O: Observer<Vec<Item>, Err>,
  I: IntoIterator,
  I::Item: Observable<Item, Err, CombineSourcesObserver<O, Item>>,
  <I::Item as Observable<Item, Err, CombineSourcesObserver<O, Item>>>::Unsub: Send + 'static,
  Item: Clone,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let sources: Vec<_> = self.0.into_iter().collect();
    let subscription = MultiSubscription::default();
    if sources.is_empty() {
      observer.complete();
      subscription.clone().unsubscribe();
      return subscription;
    }
    let state = MutArc::own(CombineSourcesState {
      observer: Some(observer),
      latest: sources.iter().map(|_| None).collect(),
      completed: 0,
    });
    for (index, source) in sources.into_iter().enumerate() {
      if subscription.is_closed() {
        break;
      }
      let unsub = source.actual_subscribe(CombineSourcesObserver {
        index,
        state: state.clone(),
        subscription: subscription.clone(),
      });
      subscription.append(unsub);
    }
    subscription
  }
}

impl<Item, Err, I> ObservableExt<Vec<Item>, Err> for CombineLatestSources<I>
where
  I: IntoIterator,
  I::Item: ObservableExt<Item, Err>,
{
}

impl<Item, Err, O> Observer<Item, Err> for CombineSourcesObserver<O, Item>
where
  O: Observer<Vec<Item>, Err>,
  Item: Clone,
{
  fn next(&mut self, value: Item) {
    let mut state = self.state.rc_deref_mut();
    if state.observer.is_none() || self.subscription.is_closed() {
      return;
    }
    let Some(slot) = state.latest.get_mut(self.index) else { return };
    *slot = Some(value);
    let row: Option<Vec<Item>> = state.latest.iter().cloned().collect();
    if let (Some(row), Some(observer)) = (row, state.observer.as_mut()) {
      observer.next(row);
    }
  }

  fn error(self, err: Err) {
    let observer = self.state.rc_deref_mut().observer.take();
    if let Some(observer) = observer {
      observer.error(err);
    }
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    let observer = {
      let mut state = self.state.rc_deref_mut();
      state.completed += 1;
      if state.completed == state.latest.len() { state.observer.take() } else { None }
    };
    if let Some(observer) = observer {
      observer.complete();
      self.subscription.unsubscribe();
    }
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
  fn zip_pairs_by_index_across_sources() {
    let mut rows = vec![];
    let mut completed = false;
    observable::zip([
      observable::from_iter(vec![1, 2, 3]),
      observable::from_iter(vec![10, 20]),
      observable::from_iter(vec![100, 200, 300]),
    ])
    .on_complete(|| completed = true)
    .subscribe(|row| rows.push(row));

    assert_eq!(rows, vec![vec![1, 10, 100], vec![2, 20, 200]]);
    assert!(completed);
  }

  #[test]
  fn zip_of_nothing_completes_at_once() {
    let mut completed = false;
    let mut rows: Vec<Vec<i32>> = vec![];
    observable::zip(Vec::<ObservableEmpty<i32>>::new())
      .on_complete(|| completed = true)
      .subscribe(|row| rows.push(row));
    assert!(rows.is_empty());
    assert!(completed);
  }

  #[test]
  fn zip_error_releases_every_source() {
    let error = Arc::new(Mutex::new(None));
    let c_error = error.clone();
    let a = PublishSubject::<i32, &'static str>::new();
    let b = PublishSubject::<i32, &'static str>::new();
    let c = PublishSubject::<i32, &'static str>::new();

    observable::zip([a.clone(), b.clone(), c.clone()]).subscribe_all(
      |_| {},
      move |e| *c_error.lock().unwrap() = Some(e),
      || {},
    );
    b.clone().error("bad");

    assert_eq!(*error.lock().unwrap(), Some("bad"));
    assert_eq!(a.observer_count(), 0);
    assert_eq!(c.observer_count(), 0);
  }

  #[test]
  fn combine_latest_waits_for_every_source() {
    let rows = Arc::new(Mutex::new(vec![]));
    let c_rows = rows.clone();
    let mut a = PublishSubject::<i32, Infallible>::new();
    let mut b = PublishSubject::<i32, Infallible>::new();
    let mut c = PublishSubject::<i32, Infallible>::new();

    observable::combine_latest([a.clone(), b.clone(), c.clone()])
      .subscribe(move |row| c_rows.lock().unwrap().push(row));

    a.next(1);
    b.next(2);
    a.next(3);
    c.next(4);
    b.next(5);
    assert_eq!(*rows.lock().unwrap(), vec![vec![3, 2, 4], vec![3, 5, 4]]);
  }

  #[test]
  fn combine_latest_completes_after_all() {
    let completed = Arc::new(Mutex::new(false));
    let c_completed = completed.clone();
    let a = PublishSubject::<i32, Infallible>::new();
    let b = PublishSubject::<i32, Infallible>::new();

    observable::combine_latest([a.clone(), b.clone()])
      .on_complete(move || *c_completed.lock().unwrap() = true)
      .subscribe(|_| {});

    a.clone().complete();
    assert!(!*completed.lock().unwrap());
    b.clone().complete();
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn unsubscribe_releases_every_source() {
    let rows = Arc::new(Mutex::new(vec![]));
    let c_rows = rows.clone();
    let mut a = PublishSubject::<i32, Infallible>::new();
    let mut b = PublishSubject::<i32, Infallible>::new();

    let subscription = observable::combine_latest([a.clone(), b.clone()])
      .subscribe(move |row| c_rows.lock().unwrap().push(row));
    assert_eq!(a.observer_count(), 1);

    subscription.unsubscribe();
    assert_eq!(a.observer_count(), 0);
    assert_eq!(b.observer_count(), 0);
    a.next(1);
    b.next(2);
    assert!(rows.lock().unwrap().is_empty());
  }
}
