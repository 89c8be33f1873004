use std::collections::VecDeque;

use crate::prelude::*;

#[derive(Clone)]
pub struct TakeLastOp<S> {
  source: S,
  count: usize,
}

impl<S> TakeLastOp<S> {
  #[inline]
  pub(crate) fn new(source: S, count: usize) -> Self { TakeLastOp { source, count } }
}

impl<Item, Err, O, S> Observable<Vec<Item>, Err, O> for TakeLastOp<S>
where
  O: Observer<Vec<Item>, Err>,
  S: Observable<Item, Err, TakeLastObserver<O, Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(TakeLastObserver {
      observer,
      count: self.count,
      queue: VecDeque::with_capacity(self.count.min(64)),
    })
  }
}

impl<Item, Err, S> ObservableExt<Vec<Item>, Err> for TakeLastOp<S> where
  S: ObservableExt<Item, Err>
{
}

pub struct TakeLastObserver<O, Item> {
  observer: O,
  count: usize,
  queue: VecDeque<Item>,
}

impl<Item, Err, O> Observer<Item, Err> for TakeLastObserver<O, Item>
where
  O: Observer<Vec<Item>, Err>,
{
  fn next(&mut self, value: Item) {
    if self.count == 0 {
      return;
    }
    if self.queue.len() == self.count {
      self.queue.pop_front();
    }
    self.queue.push_back(value);
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    self.observer.next(Vec::from(self.queue));
    self.observer.complete()
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
