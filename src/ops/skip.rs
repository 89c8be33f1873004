use crate::prelude::*;

#[derive(Clone)]
pub struct SkipOp<S> {
  source: S,
  count: usize,
}

impl<S> SkipOp<S> {
  #[inline]
  pub(crate) fn new(source: S, count: usize) -> Self { SkipOp { source, count } }
}

impl<Item, Err, O, S> Observable<Item, Err, O> for SkipOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, SkipObserver<O>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(SkipObserver { observer, remaining: self.count })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for SkipOp<S> where
  S: ObservableExt<Item, Err>
{
}

pub struct SkipObserver<O> {
  observer: O,
  remaining: usize,
}

impl<Item, Err, O> Observer<Item, Err> for SkipObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.remaining == 0 {
      self.observer.next(value);
    } else {
      self.remaining -= 1;
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
