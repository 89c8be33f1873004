use std::convert::Infallible;

use super::{Behavior, Publish, Subject, SubjectSubscription};
use crate::prelude::*;

/// A publish subject that cannot fail or complete: `accept` is the only way
/// in.
pub struct PublishRelay<Item>(Subject<Item, Infallible, Publish>);

/// A behavior subject that cannot fail or complete.
pub struct BehaviorRelay<Item>(Subject<Item, Infallible, Behavior<Item>>);

impl<Item> Clone for PublishRelay<Item> {
  fn clone(&self) -> Self { PublishRelay(self.0.clone()) }
}

impl<Item> Clone for BehaviorRelay<Item> {
  fn clone(&self) -> Self { BehaviorRelay(self.0.clone()) }
}

impl<Item: Clone> PublishRelay<Item> {
  pub fn new() -> Self { PublishRelay(Subject::<Item, Infallible, Publish>::new()) }

  /// Pushes `value` to every current subscriber.
  #[inline]
  pub fn accept(&self, value: Item) { self.0.push(value) }

  pub fn observer_count(&self) -> usize { self.0.observer_count() }
}

impl<Item: Clone> Default for PublishRelay<Item> {
  fn default() -> Self { Self::new() }
}

impl<Item: Clone> BehaviorRelay<Item> {
  pub fn new(seed: Item) -> Self {
    BehaviorRelay(Subject::<Item, Infallible, Behavior<Item>>::new(seed))
  }

  /// Replaces the current value and pushes it to every subscriber.
  #[inline]
  pub fn accept(&self, value: Item) { self.0.push(value) }

  /// The current value.
  pub fn value(&self) -> Item { self.0.value() }

  pub fn observer_count(&self) -> usize { self.0.observer_count() }
}

macro_rules! impl_relay_observable {
  ($relay: ident, $retention: ty) => {
    impl<Item, O> Observable<Item, Infallible, O> for $relay<Item>
    where
      O: Observer<Item, Infallible> + Send + 'static,
      Item: Clone + 'static,
    {
      type Unsub = SubjectSubscription<Item, Infallible, $retention>;

      #[inline]
      fn actual_subscribe(self, observer: O) -> Self::Unsub {
        self.0.actual_subscribe(observer)
      }
    }

    impl<Item> ObservableExt<Item, Infallible> for $relay<Item> {}
  };
}

impl_relay_observable!(PublishRelay, Publish);
impl_relay_observable!(BehaviorRelay, Behavior<Item>);
