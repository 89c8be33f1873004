use super::{Retention, Subject};

/// Keeps the latest value, starting from a seed.
#[derive(Clone, Debug)]
pub struct Behavior<Item> {
  value: Item,
}

impl<Item: Clone> Retention<Item> for Behavior<Item> {
  fn record(&mut self, value: &Item) -> bool {
    self.value = value.clone();
    true
  }

  fn replay(&self) -> Vec<Item> { vec![self.value.clone()] }

  // a terminated behavior subject only reports how it ended
  fn replay_terminated(&self, _: bool) -> Vec<Item> { Vec::new() }
}

/// A subject that hands every new subscriber the latest value (or the seed)
/// before any further pushes.
pub type BehaviorSubject<Item, Err> = Subject<Item, Err, Behavior<Item>>;

impl<Item, Err> Subject<Item, Err, Behavior<Item>> {
  pub fn new(seed: Item) -> Self { Self::with_retention(Behavior { value: seed }) }

  /// The latest value pushed, or the seed.
  pub fn value(&self) -> Item
  where
    Item: Clone,
  {
    self.retention(|r| r.value.clone())
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
  fn replays_seed_then_latest() {
    let first = Arc::new(Mutex::new(vec![]));
    let second = Arc::new(Mutex::new(vec![]));
    let (c_first, c_second) = (first.clone(), second.clone());
    let mut subject = BehaviorSubject::<i32, Infallible>::new(0);

    subject.clone().subscribe(move |v| c_first.lock().unwrap().push(v));
    subject.next(1);
    subject.next(2);
    subject.clone().subscribe(move |v| c_second.lock().unwrap().push(v));
    subject.next(3);

    assert_eq!(*first.lock().unwrap(), vec![0, 1, 2, 3]);
    assert_eq!(*second.lock().unwrap(), vec![2, 3]);
    assert_eq!(subject.value(), 3);
  }

  #[test]
  fn terminated_subject_sends_terminal_only() {
    let values = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));
    let (c_values, c_completed) = (values.clone(), completed.clone());
    let mut subject = BehaviorSubject::<i32, Infallible>::new(0);
    subject.next(5);
    subject.clone().complete();

    subject
      .clone()
      .on_complete(move || *c_completed.lock().unwrap() = true)
      .subscribe(move |v| c_values.lock().unwrap().push(v));

    assert!(values.lock().unwrap().is_empty());
    assert!(*completed.lock().unwrap());
    assert_eq!(subject.value(), 5);
  }
}
