use std::collections::VecDeque;

use tracing::trace;

use crate::{
  executor::Executor,
  prelude::*,
  rc::{MutArc, RcDerefMut},
};

#[derive(Clone)]
pub struct ObserveOnOp<S, E> {
  source: S,
  executor: E,
}

impl<S, E> ObserveOnOp<S, E> {
  #[inline]
  pub(crate) fn new(source: S, executor: E) -> Self { ObserveOnOp { source, executor } }
}

impl<S, E, Item, Err, O> Observable<Item, Err, O> for ObserveOnOp<S, E>
where
  S: Observable<Item, Err, ObserveOnObserver<O, E, Item, Err>>,
  S::Unsub: Send + 'static,
  O: Observer<Item, Err> + Send + 'static,
  E: Executor,
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let subscription = MultiSubscription::default();
    let observer = ObserveOnObserver {
      shared: ObserveOnShared {
        observer: MutArc::own(Some(observer)),
        queue: MutArc::own(DeliveryQueue { pending: VecDeque::new(), draining: false }),
        executor: self.executor,
        subscription: subscription.clone(),
      },
    };
    let unsub = self.source.actual_subscribe(observer);
    subscription.append(unsub);
    subscription
  }
}

impl<S, E, Item, Err> ObservableExt<Item, Err> for ObserveOnOp<S, E> where
  S: ObservableExt<Item, Err>
{
}

enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

struct DeliveryQueue<Item, Err> {
  pending: VecDeque<Notification<Item, Err>>,
  draining: bool,
}

struct ObserveOnShared<O, E, Item, Err> {
  observer: MutArc<Option<O>>,
  queue: MutArc<DeliveryQueue<Item, Err>>,
  executor: E,
  subscription: MultiSubscription,
}

impl<O, E, Item, Err> ObserveOnShared<O, E, Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
  E: Executor,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn share(&self) -> Self {
    ObserveOnShared {
      observer: self.observer.clone(),
      queue: self.queue.clone(),
      executor: self.executor.clone(),
      subscription: self.subscription.clone(),
    }
  }

  /// Queues `notification`; the first one into an idle queue schedules a
  /// drain, later ones ride along with it.
  fn push(&self, notification: Notification<Item, Err>) {
    if self.subscription.is_closed() {
      return;
    }
    let start = {
      let mut queue = self.queue.rc_deref_mut();
      queue.pending.push_back(notification);
      !std::mem::replace(&mut queue.draining, true)
    };
    if start {
      let shared = self.share();
      let handle = self.executor.run_async(move || shared.drain());
      self.subscription.append(handle);
    }
  }

  fn drain(self) {
    loop {
      let notification = {
        let mut queue = self.queue.rc_deref_mut();
        if self.subscription.is_closed() {
          queue.pending.clear();
        }
        match queue.pending.pop_front() {
          Some(n) => n,
          None => {
            queue.draining = false;
            return;
          }
        }
      };
      let mut observer = self.observer.clone();
      match notification {
        Notification::Next(value) => observer.next(value),
        Notification::Error(err) => {
          trace!("observe_on delivers error");
          observer.error(err)
        }
        Notification::Complete => observer.complete(),
      }
    }
  }
}

pub struct ObserveOnObserver<O, E, Item, Err> {
  shared: ObserveOnShared<O, E, Item, Err>,
}

impl<Item, Err, O, E> Observer<Item, Err> for ObserveOnObserver<O, E, Item, Err>
where
  O: Observer<Item, Err> + Send + 'static,
  E: Executor,
  Item: Send + 'static,
  Err: Send + 'static,
{
  #[inline]
  fn next(&mut self, value: Item) { self.shared.push(Notification::Next(value)) }

  #[inline]
  fn error(self, err: Err) { self.shared.push(Notification::Error(err)) }

  #[inline]
  fn complete(self) { self.shared.push(Notification::Complete) }

  #[inline]
  fn is_finished(&self) -> bool { self.shared.observer.is_finished() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
  };

  #[test]
  fn delivers_on_the_executor() {
    let executor = VirtualTimeExecutor::new();
    let values = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));
    let (c_values, c_completed) = (values.clone(), completed.clone());

    observable::of([1, 2, 3])
      .observe_on(executor.clone())
      .on_complete(move || *c_completed.lock().unwrap() = true)
      .subscribe(move |v| c_values.lock().unwrap().push(v));

    assert!(values.lock().unwrap().is_empty());
    executor.run_pending();
    assert_eq!(*values.lock().unwrap(), vec![1, 2, 3]);
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn unsubscribe_drops_queued_values() {
    let executor = VirtualTimeExecutor::new();
    let values = Arc::new(Mutex::new(vec![]));
    let c_values = values.clone();

    observable::of([1, 2, 3])
      .observe_on(executor.clone())
      .subscribe(move |v| c_values.lock().unwrap().push(v))
      .unsubscribe();
    executor.run_pending();
    assert!(values.lock().unwrap().is_empty());
  }

  #[test]
  fn serial_executor_keeps_order_on_one_thread() {
    let executor = SerialExecutor::new("observe-on-test").unwrap();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();

    observable::from_iter(0..100)
      .observe_on(executor.clone())
      .subscribe(move |v| {
        c_seen.lock().unwrap().push((v, thread::current().name().map(String::from)))
      });

    executor.run_sync(|| ()).unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.iter().map(|(v, _)| *v).collect::<Vec<_>>(), (0..100).collect::<Vec<_>>());
    assert!(seen.iter().all(|(_, name)| name.as_deref() == Some("observe-on-test")));
  }

  #[test]
  fn timed_source_then_observe_on() {
    let executor = VirtualTimeExecutor::new();
    let values = Arc::new(Mutex::new(vec![]));
    let c_values = values.clone();

    observable::timer(7, Duration::from_millis(5), executor.clone())
      .observe_on(executor.clone())
      .subscribe(move |v| c_values.lock().unwrap().push(v));

    executor.advance_by(Duration::from_millis(5));
    assert_eq!(*values.lock().unwrap(), vec![7]);
  }
}
