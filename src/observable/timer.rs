use std::{convert::Infallible, time::Duration};

use crate::{
  executor::{Executor, TaskHandle},
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
};

/// Returns an observable which emits `item` once after `delay` on
/// `executor`, then completes.
pub fn timer<Item, E>(item: Item, delay: Duration, executor: E) -> TimerObservable<Item, E>
where
  E: Executor,
{
  TimerObservable { item, delay, executor }
}

#[derive(Clone)]
pub struct TimerObservable<Item, E> {
  item: Item,
  delay: Duration,
  executor: E,
}

impl<Item, E, O> Observable<Item, Infallible, O> for TimerObservable<Item, E>
where
  O: Observer<Item, Infallible> + Send + 'static,
  Item: Send + 'static,
  E: Executor,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    let Self { item, delay, executor } = self;
    executor.run_after(delay, move || {
      observer.next(item);
      observer.complete();
    })
  }
}

impl<Item, E> ObservableExt<Item, Infallible> for TimerObservable<Item, E> {}

/// Returns an observable which emits `0, 1, 2, ...` every `period` on
/// `executor`. It never completes; unsubscribe to stop it.
pub fn interval<E>(period: Duration, executor: E) -> IntervalObservable<E>
where
  E: Executor,
{
  IntervalObservable { period, executor }
}

#[derive(Clone)]
pub struct IntervalObservable<E> {
  period: Duration,
  executor: E,
}

fn schedule_tick<O, E>(
  executor: E,
  period: Duration,
  count: usize,
  mut observer: O,
  slot: SerialSubscription,
  latest: MutArc<usize>,
) where
  O: Observer<usize, Infallible> + Send + 'static,
  E: Executor,
{
  let c_executor = executor.clone();
  let (c_slot, c_latest) = (slot.clone(), latest.clone());
  let handle = executor.run_after(period, move || {
    observer.next(count);
    if !observer.is_finished() {
      *c_latest.rc_deref_mut() = count + 1;
      schedule_tick(c_executor, period, count + 1, observer, c_slot, c_latest);
    }
  });
  // On a pool the tick may already have run and installed its successor.
  let guard = latest.rc_deref();
  if *guard == count {
    slot.replace(handle);
  } else {
    drop(guard);
    handle.unsubscribe();
  }
}

impl<E, O> Observable<usize, Infallible, O> for IntervalObservable<E>
where
  O: Observer<usize, Infallible> + Send + 'static,
  E: Executor,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let slot = SerialSubscription::default();
    schedule_tick(self.executor, self.period, 0, observer, slot.clone(), MutArc::own(0));
    slot
  }
}

impl<E> ObservableExt<usize, Infallible> for IntervalObservable<E> {}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    sync::{Arc, Mutex},
    time::Duration,
  };

  #[test]
  fn timer_shall_emit_value() {
    let executor = VirtualTimeExecutor::new();
    let emitted = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));
    let (c_emitted, c_completed) = (emitted.clone(), completed.clone());

    observable::timer(1234, Duration::from_millis(5), executor.clone())
      .on_complete(move || *c_completed.lock().unwrap() = true)
      .subscribe(move |v| c_emitted.lock().unwrap().push(v));

    executor.advance_by(Duration::from_millis(4));
    assert!(emitted.lock().unwrap().is_empty());
    executor.advance_by(Duration::from_millis(1));
    assert_eq!(*emitted.lock().unwrap(), vec![1234]);
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn timer_can_be_cancelled() {
    let executor = VirtualTimeExecutor::new();
    let emitted = Arc::new(Mutex::new(0));
    let c_emitted = emitted.clone();
    observable::timer(1, Duration::from_millis(5), executor.clone())
      .subscribe(move |_| *c_emitted.lock().unwrap() += 1)
      .unsubscribe();
    executor.advance_by(Duration::from_millis(10));
    assert_eq!(*emitted.lock().unwrap(), 0);
  }

  #[test]
  fn interval_ticks_until_unsubscribed() {
    let executor = VirtualTimeExecutor::new();
    let ticks = Arc::new(Mutex::new(vec![]));
    let c_ticks = ticks.clone();
    let subscription = observable::interval(Duration::from_millis(10), executor.clone())
      .subscribe(move |v| c_ticks.lock().unwrap().push(v));

    executor.advance_by(Duration::from_millis(35));
    assert_eq!(*ticks.lock().unwrap(), vec![0, 1, 2]);

    subscription.unsubscribe();
    executor.advance_by(Duration::from_millis(50));
    assert_eq!(*ticks.lock().unwrap(), vec![0, 1, 2]);
  }

  #[test]
  fn interval_stops_when_downstream_takes_enough() {
    let executor = VirtualTimeExecutor::new();
    let ticks = Arc::new(Mutex::new(vec![]));
    let c_ticks = ticks.clone();
    observable::interval(Duration::from_millis(1), executor.clone())
      .take(3)
      .subscribe(move |v| c_ticks.lock().unwrap().push(v));

    executor.advance_by(Duration::from_millis(10));
    assert_eq!(*ticks.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(executor.pending(), 0);
  }

  #[cfg(feature = "futures-scheduler")]
  #[test]
  fn interval_keeps_ticking_on_thread_pool() {
    let executor = ThreadPoolExecutor::new().unwrap();
    let ticks = Arc::new(Mutex::new(0));
    let c_ticks = ticks.clone();
    let subscription = observable::interval(Duration::from_micros(200), executor)
      .subscribe(move |_| *c_ticks.lock().unwrap() += 1);

    std::thread::sleep(Duration::from_millis(30));
    let seen = *ticks.lock().unwrap();
    std::thread::sleep(Duration::from_millis(30));
    assert!(*ticks.lock().unwrap() > seen);
    subscription.unsubscribe();
  }
}
