use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use tracing::trace;

use crate::{
  observer::BoxedObserver,
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
  subscription::BoxSubscription,
  type_hint::TypeHint,
};

/// Creates an observable from a producer function.
///
/// The producer runs once per subscription. It receives an [`Emitter`] to
/// push notifications into, which may be cloned and moved to other threads,
/// and returns a teardown subscription. The teardown runs when the
/// subscriber unsubscribes or right after the emitter delivers a terminal
/// event, whichever comes first, and it runs once.
///
/// ```
/// use rxkit::prelude::*;
/// use std::convert::Infallible;
///
/// observable::create(|mut emitter: Emitter<i32, Infallible>| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
/// })
/// .subscribe(|v| println!("{}", v));
/// ```
pub fn create<Item, Err, F, U>(producer: F) -> ObservableCreate<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription,
{
  ObservableCreate { producer, _hint: TypeHint::new() }
}

#[derive(Clone)]
pub struct ObservableCreate<F, Item, Err> {
  producer: F,
  _hint: TypeHint<(Item, Err)>,
}

// `observer` is the delivery lock. Unsubscribing never blocks on it, so a
// downstream that unsubscribes from inside `next` can't deadlock.
struct CreateShared<Item, Err> {
  closed: AtomicBool,
  released: AtomicBool,
  observer: MutArc<Option<BoxedObserver<'static, Item, Err>>>,
  teardown: MutArc<Option<BoxSubscription>>,
}

impl<Item, Err> CreateShared<Item, Err> {
  fn take_teardown(&self) -> Option<BoxSubscription> { self.teardown.rc_deref_mut().take() }
}

/// The handle a producer pushes notifications through. Once a terminal
/// event went out, or the subscriber unsubscribed, further calls are
/// ignored.
pub struct Emitter<Item, Err>(Arc<CreateShared<Item, Err>>);

impl<Item, Err> Clone for Emitter<Item, Err> {
  fn clone(&self) -> Self { Emitter(self.0.clone()) }
}

impl<Item, Err> Emitter<Item, Err> {
  /// `true` once nothing more will be delivered.
  pub fn is_closed(&self) -> bool { self.0.closed.load(Ordering::Acquire) }

  fn terminate(self, deliver: impl FnOnce(BoxedObserver<'static, Item, Err>)) {
    if self.0.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let observer = self.0.observer.rc_deref_mut().take();
    if let Some(observer) = observer {
      deliver(observer);
    }
    if let Some(teardown) = self.0.take_teardown() {
      teardown.unsubscribe();
    }
  }
}

impl<Item, Err> Observer<Item, Err> for Emitter<Item, Err> {
  fn next(&mut self, value: Item) {
    if self.is_closed() {
      return;
    }
    let mut slot = self.0.observer.rc_deref_mut();
    if let Some(observer) = slot.as_mut() {
      observer.next(value);
    }
    // An unsubscribe that raced this delivery left the observer behind.
    let released = if self.0.released.load(Ordering::Acquire) { slot.take() } else { None };
    drop(slot);
    drop(released);
  }

  fn error(self, err: Err) { self.terminate(|o| o.error(err)) }

  fn complete(self) { self.terminate(|o| o.complete()) }

  fn is_finished(&self) -> bool {
    self.is_closed()
      || self
        .0
        .observer
        .rc_deref()
        .as_ref()
        .map_or(true, |o| o.is_finished())
  }
}

/// Subscription returned by [`create`]: releases the observer and runs the
/// producer's teardown.
pub struct CreateSubscription<Item, Err>(Arc<CreateShared<Item, Err>>);

impl<Item, Err> Subscription for CreateSubscription<Item, Err> {
  fn unsubscribe(self) {
    self.0.closed.store(true, Ordering::Release);
    self.0.released.store(true, Ordering::Release);
    let observer = self.0.observer.try_rc_deref_mut().and_then(|mut slot| slot.take());
    drop(observer);
    if let Some(teardown) = self.0.take_teardown() {
      trace!("create teardown");
      teardown.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.closed.load(Ordering::Acquire) }
}

impl<F, Item, Err, O, U> Observable<Item, Err, O> for ObservableCreate<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription + Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  Item: 'static,
  Err: 'static,
{
  type Unsub = CreateSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let shared = Arc::new(CreateShared {
      closed: AtomicBool::new(false),
      released: AtomicBool::new(false),
      observer: MutArc::own(Some(Box::new(observer) as BoxedObserver<'static, Item, Err>)),
      teardown: MutArc::own(None),
    });
    let teardown = (self.producer)(Emitter(shared.clone()));
    // Closing sets the flag before it takes the teardown slot, so checking
    // under the slot lock can't miss a close.
    let finished_early = {
      let mut slot = shared.teardown.rc_deref_mut();
      if shared.closed.load(Ordering::Acquire) {
        Some(teardown)
      } else {
        *slot = Some(BoxSubscription::new(teardown));
        None
      }
    };
    if let Some(teardown) = finished_early {
      teardown.unsubscribe();
    }
    CreateSubscription(shared)
  }
}

impl<F, Item, Err> ObservableExt<Item, Err> for ObservableCreate<F, Item, Err> {}
