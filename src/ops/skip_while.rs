use crate::prelude::*;

#[derive(Clone)]
pub struct SkipWhileOp<S, F> {
  source: S,
  predicate: F,
}

impl<S, F> SkipWhileOp<S, F> {
  #[inline]
  pub(crate) fn new(source: S, predicate: F) -> Self { SkipWhileOp { source, predicate } }
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for SkipWhileOp<S, F>
where
  S: Observable<Item, Err, SkipWhileObserver<O, F>>,
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(SkipWhileObserver {
      observer,
      predicate: self.predicate,
      done_skipping: false,
    })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for SkipWhileOp<S, F> where
  S: ObservableExt<Item, Err>
{
}

pub struct SkipWhileObserver<O, F> {
  observer: O,
  predicate: F,
  done_skipping: bool,
}

impl<O, Item, Err, F> Observer<Item, Err> for SkipWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if self.done_skipping {
      self.observer.next(value);
    } else if !(self.predicate)(&value) {
      self.done_skipping = true;
      self.observer.next(value);
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err); }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
