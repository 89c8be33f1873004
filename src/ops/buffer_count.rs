use crate::prelude::*;

#[derive(Clone)]
pub struct BufferCountOp<S> {
  source: S,
  count: usize,
}

impl<S> BufferCountOp<S> {
  #[inline]
  pub(crate) fn new(source: S, count: usize) -> Self {
    BufferCountOp { source, count: count.max(1) }
  }
}

impl<Item, Err, O, S> Observable<Vec<Item>, Err, O> for BufferCountOp<S>
where
  O: Observer<Vec<Item>, Err>,
  S: Observable<Item, Err, BufferCountObserver<O, Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(BufferCountObserver {
      observer,
      count: self.count,
      frame: Vec::with_capacity(self.count.min(64)),
    })
  }
}

impl<Item, Err, S> ObservableExt<Vec<Item>, Err> for BufferCountOp<S> where
  S: ObservableExt<Item, Err>
{
}

pub struct BufferCountObserver<O, Item> {
  observer: O,
  count: usize,
  frame: Vec<Item>,
}

impl<Item, Err, O> Observer<Item, Err> for BufferCountObserver<O, Item>
where
  O: Observer<Vec<Item>, Err>,
{
  fn next(&mut self, value: Item) {
    self.frame.push(value);
    if self.frame.len() >= self.count {
      let frame = std::mem::take(&mut self.frame);
      self.observer.next(frame);
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    if !self.frame.is_empty() {
      self.observer.next(self.frame);
    }
    self.observer.complete()
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
