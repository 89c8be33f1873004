use std::collections::VecDeque;

use super::{Retention, Subject};

/// Keeps up to `capacity` of the most recent values, oldest evicted first.
#[derive(Clone, Debug)]
pub struct Replay<Item> {
  buffer: VecDeque<Item>,
  capacity: usize,
}

impl<Item: Clone> Retention<Item> for Replay<Item> {
  fn record(&mut self, value: &Item) -> bool {
    if self.capacity > 0 {
      if self.buffer.len() == self.capacity {
        self.buffer.pop_front();
      }
      self.buffer.push_back(value.clone());
    }
    true
  }

  fn replay(&self) -> Vec<Item> { self.buffer.iter().cloned().collect() }

  fn replay_terminated(&self, _: bool) -> Vec<Item> { self.replay() }
}

/// A subject that replays its retained values, in push order, to every new
/// subscriber.
pub type ReplaySubject<Item, Err> = Subject<Item, Err, Replay<Item>>;

impl<Item, Err> Subject<Item, Err, Replay<Item>> {
  /// Retains at most `capacity` values.
  pub fn new(capacity: usize) -> Self {
    Self::with_retention(Replay {
      buffer: VecDeque::with_capacity(capacity.min(64)),
      capacity,
    })
  }

  /// Retains every value pushed.
  pub fn unbounded() -> Self {
    Self::with_retention(Replay { buffer: VecDeque::new(), capacity: usize::MAX })
  }

  /// Number of values currently retained.
  pub fn retained(&self) -> usize { self.retention(|r| r.buffer.len()) }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
  };

  #[test]
  fn evicts_oldest_first() {
    let values = Arc::new(Mutex::new(vec![]));
    let c_values = values.clone();
    let mut subject = ReplaySubject::<i32, Infallible>::new(2);
    (1..=4).for_each(|v| subject.next(v));
    assert_eq!(subject.retained(), 2);

    subject.clone().subscribe(move |v| c_values.lock().unwrap().push(v));
    subject.next(5);
    assert_eq!(*values.lock().unwrap(), vec![3, 4, 5]);
  }

  #[test]
  fn replays_buffer_then_error() {
    let values = Arc::new(Mutex::new(vec![]));
    let error = Arc::new(Mutex::new(None));
    let (c_values, c_error) = (values.clone(), error.clone());
    let mut subject = ReplaySubject::<i32, &'static str>::unbounded();
    subject.next(1);
    subject.next(2);
    subject.clone().error("late");

    subject.clone().subscribe_all(
      move |v| c_values.lock().unwrap().push(v),
      move |e| *c_error.lock().unwrap() = Some(e),
      || {},
    );
    assert_eq!(*values.lock().unwrap(), vec![1, 2]);
    assert_eq!(*error.lock().unwrap(), Some("late"));
  }

  #[test]
  fn zero_capacity_keeps_nothing() {
    let values = Arc::new(Mutex::new(vec![]));
    let c_values = values.clone();
    let mut subject = ReplaySubject::<i32, Infallible>::new(0);
    subject.next(1);
    subject.clone().subscribe(move |v| c_values.lock().unwrap().push(v));
    assert!(values.lock().unwrap().is_empty());
    assert_eq!(subject.retained(), 0);
  }
}
