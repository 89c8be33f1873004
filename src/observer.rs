//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use std::convert::Infallible;

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable. The terminal methods consume the observer, so once `error`
/// or `complete` ran there is nothing left to call `next` on.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  fn error(self, err: Err);

  /// Handle completion of the observable
  fn complete(self);

  /// Returns `true` once the observer will not accept more values.
  ///
  /// Sources poll this to stop producing early, e.g. after a `take`
  /// downstream has seen enough.
  fn is_finished(&self) -> bool;
}

/// Object-safe mirror of [`Observer`], so observers can be stored as
/// `Box<dyn DynObserver>` by subjects and type-erased producers.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_finished(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  #[inline]
  fn box_next(&mut self, value: Item) { self.next(value) }
  #[inline]
  fn box_error(self: Box<Self>, err: Err) { (*self).error(err) }
  #[inline]
  fn box_complete(self: Box<Self>) { (*self).complete() }
  #[inline]
  fn box_is_finished(&self) -> bool { self.is_finished() }
}

/// Boxed observer that can be handed across threads.
pub type BoxedObserver<'a, Item, Err> = Box<dyn DynObserver<Item, Err> + Send + 'a>;

impl<'a, Item, Err> Observer<Item, Err> for BoxedObserver<'a, Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_finished(&self) -> bool { (**self).box_is_finished() }
}

/// Closure adapter used by `subscribe(|v| ...)`.
///
/// Only streams that cannot fail accept a bare `next` closure; fallible
/// streams go through `subscribe_all` or `on_error` first.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item> Observer<Item, Infallible> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }

  #[inline]
  fn error(self, err: Infallible) { match err {} }

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_finished(&self) -> bool { false }
}

/// Observer built from three callbacks, used by `subscribe_all`.
#[derive(Clone)]
pub struct ObserverAll<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

impl<N, E, C> ObserverAll<N, E, C> {
  #[inline]
  pub fn new(next: N, error: E, complete: C) -> Self {
    ObserverAll { next, error, complete }
  }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for ObserverAll<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value); }

  #[inline]
  fn error(self, err: Err) { (self.error)(err); }

  #[inline]
  fn complete(self) { (self.complete)(); }

  #[inline]
  fn is_finished(&self) -> bool { false }
}

#[cfg(test)]
mod test {
  use super::*;

  struct Recorder {
    values: Vec<i32>,
  }

  impl Observer<i32, ()> for Recorder {
    fn next(&mut self, value: i32) { self.values.push(value); }

    fn error(self, _: ()) {}

    fn complete(self) {}

    fn is_finished(&self) -> bool { false }
  }

  #[test]
  fn observer_trait() {
    let mut obs = Recorder { values: vec![] };
    obs.next(1);
    obs.next(2);
    assert_eq!(obs.values, vec![1, 2]);
    assert!(!obs.is_finished());
  }

  #[test]
  fn closure_as_observer() {
    let mut count = 0;
    let mut closure_obs = FnMutObserver(|v: i32| count += v);
    closure_obs.next(10);
    closure_obs.next(20);
    assert_eq!(count, 30);
  }

  #[test]
  fn boxed_observer_forwards_terminal() {
    let mut completed = false;
    let mut sum = 0;
    {
      let mut boxed: BoxedObserver<'_, i32, ()> = Box::new(ObserverAll::new(
        |v| sum += v,
        |_: ()| {},
        || completed = true,
      ));
      boxed.next(3);
      boxed.next(4);
      boxed.complete();
    }
    assert_eq!(sum, 7);
    assert!(completed);
  }
}
