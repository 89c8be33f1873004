use std::{
  fmt::{Debug, Formatter},
  mem,
};

use smallvec::SmallVec;

use crate::rc::{MutArc, RcDeref, RcDerefMut};

/// Subscription returns from `Observable.subscribe(Subscriber)` to allow
/// unsubscribing.
///
/// Unsubscribing stops all further emissions to the observer and releases
/// the upstream resources the subscription retains. It never triggers the
/// observer's `error` or `complete`.
pub trait Subscription {
  /// This allows deregistering a stream before it has finished receiving
  /// all events (i.e. before `complete` is called).
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;
}

/// Synchronous sources have finished by the time `subscribe` returns, so
/// there is nothing left to release.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

trait DynSubscription: Send {
  fn dyn_unsubscribe(self: Box<Self>);
  fn dyn_is_closed(&self) -> bool;
}

impl<T: Subscription + Send> DynSubscription for T {
  #[inline]
  fn dyn_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn dyn_is_closed(&self) -> bool { self.is_closed() }
}

/// A type-erased subscription.
pub struct BoxSubscription(Box<dyn DynSubscription>);

impl BoxSubscription {
  #[inline]
  pub fn new(subscription: impl Subscription + Send + 'static) -> Self {
    BoxSubscription(Box::new(subscription))
  }
}

impl Subscription for BoxSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.dyn_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.dyn_is_closed() }
}

impl Debug for BoxSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BoxSubscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

#[derive(Default)]
struct MultiInner {
  closed: bool,
  teardown: SmallVec<[BoxSubscription; 2]>,
}

/// A composite subscription: unsubscribing it unsubscribes every
/// subscription appended to it, exactly once.
///
/// Appending to an already closed `MultiSubscription` unsubscribes the new
/// subscription immediately.
#[derive(Clone, Default)]
pub struct MultiSubscription(MutArc<MultiInner>);

impl MultiSubscription {
  pub fn append(&self, subscription: impl Subscription + Send + 'static) {
    let mut inner = self.0.rc_deref_mut();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      inner.teardown.retain(|s| !s.is_closed());
      inner.teardown.push(BoxSubscription::new(subscription));
    }
  }

  pub fn teardown_size(&self) -> usize { self.0.rc_deref().teardown.len() }
}

impl Subscription for MultiSubscription {
  fn unsubscribe(self) {
    let teardown = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      mem::take(&mut inner.teardown)
    };
    for s in teardown {
      s.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

impl Debug for MultiSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let inner = self.0.rc_deref();
    f.debug_struct("MultiSubscription")
      .field("closed", &inner.closed)
      .field("teardown_count", &inner.teardown.len())
      .finish()
  }
}

#[derive(Default)]
struct SerialInner {
  closed: bool,
  current: Option<BoxSubscription>,
}

/// Holds at most one live subscription. Replacing it unsubscribes the
/// previous one; once closed, anything put in is unsubscribed right away.
///
/// Used where the subscription to release is only known later: the current
/// inner stream of `switch_latest`, the pending timer of `buffer`, or an
/// upstream that has to be cut from inside its own emission.
#[derive(Clone, Default)]
pub struct SerialSubscription(MutArc<SerialInner>);

impl SerialSubscription {
  pub fn replace(&self, subscription: impl Subscription + Send + 'static) {
    let stale = {
      let mut inner = self.0.rc_deref_mut();
      let subscription = BoxSubscription::new(subscription);
      if inner.closed {
        Some(subscription)
      } else {
        inner.current.replace(subscription)
      }
    };
    if let Some(stale) = stale {
      stale.unsubscribe();
    }
  }

  /// Unsubscribes the current subscription without closing the slot.
  pub fn clear(&self) {
    let stale = self.0.rc_deref_mut().current.take();
    if let Some(stale) = stale {
      stale.unsubscribe();
    }
  }
}

impl Subscription for SerialSubscription {
  fn unsubscribe(self) {
    let stale = {
      let mut inner = self.0.rc_deref_mut();
      inner.closed = true;
      inner.current.take()
    };
    if let Some(stale) = stale {
      stale.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

/// Two subscriptions released together.
#[derive(Clone, Debug, Default)]
pub struct ZipSubscription<A, B> {
  a: A,
  b: B,
}

impl<A, B> ZipSubscription<A, B> {
  pub fn new(a: A, b: B) -> Self { ZipSubscription { a, b } }
}

impl<A: Subscription, B: Subscription> Subscription for ZipSubscription<A, B> {
  fn unsubscribe(self) {
    self.a.unsubscribe();
    self.b.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.a.is_closed() && self.b.is_closed() }
}

/// Wrapper around a subscription which provides the
/// `unsubscribe_when_dropped()` method.
#[derive(Debug)]
pub struct SubscriptionWrapper<T: Subscription>(pub(crate) T);

impl<T: Subscription> SubscriptionWrapper<T> {
  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<T> {
    SubscriptionGuard(Some(self.0))
  }

  /// Consumes this wrapper and returns the underlying subscription.
  pub fn into_inner(self) -> T { self.0 }
}

impl<T: Subscription> Subscription for SubscriptionWrapper<T> {
  #[inline]
  fn unsubscribe(self) { self.0.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription
/// will be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior
  /// for it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> {
    SubscriptionGuard(Some(subscription))
  }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.unsubscribe()
    }
  }
}
