use std::{fmt::Display, time::Duration};

use crate::{
  error::RxError,
  executor::Executor,
  observer::{FnMutObserver, Observer, ObserverAll},
  ops::{
    buffer::BufferOp,
    buffer_count::BufferCountOp,
    collect::CollectOp,
    combine_latest::CombineLatestOp,
    distinct_until_changed::DistinctUntilChangedOp,
    element_at::ElementAtOp,
    filter::FilterOp,
    ignore_elements::IgnoreElementsOp,
    last::LastOp,
    map::MapOp,
    map_err::MapErrOp,
    merge::MergeOp,
    merge_all::{FlatMapOp, MergeAllOp},
    observe_on::ObserveOnOp,
    on_complete::OnCompleteOp,
    on_error::OnErrorOp,
    reduce::ReduceOp,
    scan::ScanOp,
    skip::SkipOp,
    skip_while::SkipWhileOp,
    start_with::StartWithOp,
    switch_latest::{FlatMapLatestOp, SwitchLatestOp},
    take::TakeOp,
    take_last::TakeLastOp,
    take_while::TakeWhileOp,
    try_map::TryMapOp,
    window::WindowOp,
    with_latest_from::WithLatestFromOp,
    zip::ZipOp,
  },
  subscription::{Subscription, SubscriptionWrapper},
};

mod combine;
mod create;
mod from_iter;
mod merge;
mod of;
mod timer;
mod trivial;

pub use combine::*;
pub use create::*;
pub use from_iter::*;
pub use merge::*;
pub use of::*;
pub use timer::*;
pub use trivial::*;

/// A lazy description of a sequence of values over time.
///
/// `actual_subscribe` starts one independent execution that delivers into
/// `observer`. Observables are consumed by subscribing; subscribe to a
/// `clone()` to run the same description again.
pub trait Observable<Item, Err, O> {
  type Unsub: Subscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// The chainable operator surface, available on every observable.
pub trait ObservableExt<Item, Err>: Sized {
  /// Invokes an execution of an infallible observable, calling `next` for
  /// every value.
  #[inline]
  fn subscribe<N>(
    self,
    next: N,
  ) -> SubscriptionWrapper<<Self as Observable<Item, Err, FnMutObserver<N>>>::Unsub>
  where
    N: FnMut(Item),
    Self: Observable<Item, Err, FnMutObserver<N>>,
  {
    SubscriptionWrapper(self.actual_subscribe(FnMutObserver(next)))
  }

  /// Invokes an execution and registers handlers for every notification.
  #[inline]
  fn subscribe_all<N, E, C>(
    self,
    next: N,
    error: E,
    complete: C,
  ) -> SubscriptionWrapper<
    <Self as Observable<Item, Err, ObserverAll<N, E, C>>>::Unsub,
  >
  where
    N: FnMut(Item),
    E: FnOnce(Err),
    C: FnOnce(),
    Self: Observable<Item, Err, ObserverAll<N, E, C>>,
  {
    SubscriptionWrapper(
      self.actual_subscribe(ObserverAll::new(next, error, complete)),
    )
  }

  /// Invokes an execution delivering into `observer`.
  #[inline]
  fn subscribe_with<O>(
    self,
    observer: O,
  ) -> SubscriptionWrapper<<Self as Observable<Item, Err, O>>::Unsub>
  where
    O: Observer<Item, Err>,
    Self: Observable<Item, Err, O>,
  {
    SubscriptionWrapper(self.actual_subscribe(observer))
  }

  /// Creates a new stream which calls a closure on each element and uses
  /// its return as the value.
  #[inline]
  fn map<B, F>(self, f: F) -> MapOp<Self, F, Item>
  where
    F: FnMut(Item) -> B,
  {
    MapOp::new(self, f)
  }

  /// Like `map`, but the closure may fail. The first failure is delivered
  /// as [`RxError::TransformFailure`] and releases the upstream.
  #[inline]
  fn try_map<B, E, F>(self, f: F) -> TryMapOp<Self, F, Item, Err>
  where
    F: FnMut(Item) -> Result<B, E>,
    E: Display,
    Err: Into<RxError>,
  {
    TryMapOp::new(self, f)
  }

  /// Transforms the error of the stream.
  #[inline]
  fn map_err<E, F>(self, f: F) -> MapErrOp<Self, F, Err>
  where
    F: FnOnce(Err) -> E,
  {
    MapErrOp::new(self, f)
  }

  /// Handles the error in place; the resulting stream cannot fail.
  #[inline]
  fn on_error<F>(self, f: F) -> OnErrorOp<Self, F, Err>
  where
    F: FnOnce(Err),
  {
    OnErrorOp::new(self, f)
  }

  /// Calls `f` when the stream completes, before passing completion on.
  #[inline]
  fn on_complete<F>(self, f: F) -> OnCompleteOp<Self, F>
  where
    F: FnOnce(),
  {
    OnCompleteOp::new(self, f)
  }

  /// Folds every value into an accumulator and emits each intermediate
  /// accumulator.
  #[inline]
  fn scan<Acc, F>(self, seed: Acc, f: F) -> ScanOp<Self, F, Acc, Item>
  where
    F: FnMut(Acc, Item) -> Acc,
    Acc: Clone,
  {
    ScanOp::new(self, seed, f)
  }

  /// Folds every value into an accumulator and emits the final accumulator
  /// once, on completion. An empty source emits `seed`.
  #[inline]
  fn reduce<Acc, F>(self, seed: Acc, f: F) -> ReduceOp<Self, F, Acc, Item>
  where
    F: FnMut(Acc, Item) -> Acc,
    Acc: Clone,
  {
    LastOp::new(ScanOp::new(self, seed.clone(), f), Some(seed))
  }

  /// Emits only the last value, on completion.
  #[inline]
  fn last(self) -> LastOp<Self, Item> { LastOp::new(self, None) }

  /// Emits the last value on completion, or `default` if there was none.
  #[inline]
  fn last_or(self, default: Item) -> LastOp<Self, Item> {
    LastOp::new(self, Some(default))
  }

  /// Gathers every value into a collection, emitted once on completion.
  #[inline]
  fn collect<C>(self) -> CollectOp<Self, C, Item>
  where
    C: Default + Extend<Item>,
  {
    CollectOp::new(self)
  }

  /// Flattens a stream of observables, keeping at most `concurrent` inner
  /// subscriptions alive. Further inner observables wait in arrival order.
  #[inline]
  fn merge_all(self, concurrent: usize) -> MergeAllOp<Self, Item> {
    MergeAllOp::new(self, concurrent)
  }

  /// Maps each value to an observable and merges all of them. Earlier inner
  /// subscriptions are never cancelled by later ones.
  #[inline]
  fn flat_map<Inner, F>(self, f: F) -> FlatMapOp<Self, F, Item, Inner>
  where
    F: FnMut(Item) -> Inner,
  {
    MergeAllOp::new(MapOp::new(self, f), usize::MAX)
  }

  /// Maps each value to an observable and subscribes to them one after
  /// another.
  #[inline]
  fn concat_map<Inner, F>(self, f: F) -> FlatMapOp<Self, F, Item, Inner>
  where
    F: FnMut(Item) -> Inner,
  {
    MergeAllOp::new(MapOp::new(self, f), 1)
  }

  /// Subscribes to the inner observables one after another.
  #[inline]
  fn concat_all(self) -> MergeAllOp<Self, Item> { MergeAllOp::new(self, 1) }

  /// Mirrors only the most recent inner observable, releasing the previous
  /// one before subscribing to the next.
  #[inline]
  fn switch_latest(self) -> SwitchLatestOp<Self, Item> {
    SwitchLatestOp::new(self)
  }

  /// Maps each value to an observable and mirrors only the latest one.
  #[inline]
  fn flat_map_latest<Inner, F>(
    self,
    f: F,
  ) -> FlatMapLatestOp<Self, F, Item, Inner>
  where
    F: FnMut(Item) -> Inner,
  {
    SwitchLatestOp::new(MapOp::new(self, f))
  }

  /// Collects values into frames, flushed when `count` values arrived or
  /// `time_span` elapsed since the frame opened, whichever happens first.
  #[inline]
  fn buffer<E>(
    self,
    time_span: Duration,
    count: usize,
    executor: E,
  ) -> BufferOp<Self, E>
  where
    E: Executor,
  {
    BufferOp::new(self, time_span, count, executor)
  }

  /// Collects values into frames of `count`; a shorter final frame is
  /// flushed on completion.
  #[inline]
  fn buffer_count(self, count: usize) -> BufferCountOp<Self> {
    BufferCountOp::new(self, count)
  }

  /// Splits the stream into nested observables with the same triggers as
  /// `buffer`.
  #[inline]
  fn window<E>(
    self,
    time_span: Duration,
    count: usize,
    executor: E,
  ) -> WindowOp<Self, E>
  where
    E: Executor,
  {
    WindowOp::new(self, time_span, count, executor)
  }

  /// Emits only the values that satisfy `filter`.
  #[inline]
  fn filter<F>(self, filter: F) -> FilterOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    FilterOp::new(self, filter)
  }

  /// Drops values equal to the previously forwarded one.
  #[inline]
  fn distinct_until_changed(self) -> DistinctUntilChangedOp<Self>
  where
    Item: PartialEq + Clone,
  {
    DistinctUntilChangedOp::new(self)
  }

  /// Emits the first `count` values, then completes and releases the
  /// upstream.
  #[inline]
  fn take(self, count: usize) -> TakeOp<Self> { TakeOp::new(self, count) }

  /// Drops the first `count` values.
  #[inline]
  fn skip(self, count: usize) -> SkipOp<Self> { SkipOp::new(self, count) }

  /// Emits the last `count` values as one `Vec` once the source completes.
  #[inline]
  fn take_last(self, count: usize) -> TakeLastOp<Self> {
    TakeLastOp::new(self, count)
  }

  /// Emits values while `predicate` holds and completes at the first value
  /// that fails it.
  #[inline]
  fn take_while<F>(self, predicate: F) -> TakeWhileOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    TakeWhileOp::new(self, predicate)
  }

  /// Drops values while `predicate` holds, then forwards everything.
  #[inline]
  fn skip_while<F>(self, predicate: F) -> SkipWhileOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    SkipWhileOp::new(self, predicate)
  }

  /// Emits only the value at zero-based `index`. Fails with
  /// [`RxError::InsufficientElements`] if the source completes first.
  #[inline]
  fn element_at(self, index: usize) -> ElementAtOp<Self, Err>
  where
    Err: Into<RxError>,
  {
    ElementAtOp::new(self, index)
  }

  /// Drops every value; only the terminal event passes.
  #[inline]
  fn ignore_elements(self) -> IgnoreElementsOp<Self> {
    IgnoreElementsOp::new(self)
  }

  /// Interleaves the values of both streams as they arrive.
  #[inline]
  fn merge<S>(self, other: S) -> MergeOp<Self, S>
  where
    S: ObservableExt<Item, Err>,
  {
    MergeOp::new(self, other)
  }

  /// Pairs values from both streams by arrival index.
  #[inline]
  fn zip<S, B>(self, other: S) -> ZipOp<Self, S>
  where
    S: ObservableExt<B, Err>,
  {
    ZipOp::new(self, other)
  }

  /// Combines the latest value of each stream whenever either emits, once
  /// both have emitted.
  #[inline]
  fn combine_latest<S, B, Out, F>(
    self,
    other: S,
    f: F,
  ) -> CombineLatestOp<Self, S, F, (Item, B)>
  where
    S: ObservableExt<B, Err>,
    F: FnMut(Item, B) -> Out,
  {
    CombineLatestOp::new(self, other, f)
  }

  /// Pairs each value with the latest value of `other`. Values of `other`
  /// never trigger an emission on their own.
  #[inline]
  fn with_latest_from<S, B>(self, other: S) -> WithLatestFromOp<Self, S>
  where
    S: ObservableExt<B, Err>,
  {
    WithLatestFromOp::new(self, other)
  }

  /// Emits `value` first, synchronously, on every subscription.
  #[inline]
  fn start_with(self, value: Item) -> StartWithOp<Self, Item> {
    StartWithOp::new(self, value)
  }

  /// Delivers every notification on `executor`, in the order received.
  #[inline]
  fn observe_on<E>(self, executor: E) -> ObserveOnOp<Self, E>
  where
    E: Executor,
  {
    ObserveOnOp::new(self, executor)
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
  fn cold_resubscription_runs_twice() {
    let runs = Arc::new(Mutex::new(0));
    let c_runs = runs.clone();
    let source =
      observable::create(move |mut emitter: Emitter<i32, Infallible>| {
        *c_runs.lock().unwrap() += 1;
        emitter.next(1);
        emitter.complete();
      });

    let first = Arc::new(Mutex::new(vec![]));
    let second = Arc::new(Mutex::new(vec![]));
    let (c_first, c_second) = (first.clone(), second.clone());
    source.clone().subscribe(move |v| c_first.lock().unwrap().push(v));
    source.subscribe(move |v| c_second.lock().unwrap().push(v));

    assert_eq!(*runs.lock().unwrap(), 2);
    assert_eq!(*first.lock().unwrap(), vec![1]);
    assert_eq!(*second.lock().unwrap(), vec![1]);
  }

  #[test]
  fn subscribe_all_reports_every_notification() {
    let mut values = vec![];
    let mut errors = vec![];
    let mut completed = false;
    observable::of([1, 2])
      .map_err(|e: Infallible| -> RxError { match e {} })
      .element_at(5)
      .subscribe_all(
        |v| values.push(v),
        |e| errors.push(e),
        || completed = true,
      );

    assert!(values.is_empty());
    assert_eq!(errors, vec![RxError::InsufficientElements { index: 5, count: 2 }]);
    assert!(!completed);
  }
}
