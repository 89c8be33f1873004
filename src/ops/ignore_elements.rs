use crate::prelude::*;

#[derive(Clone)]
pub struct IgnoreElementsOp<S> {
  source: S,
}

impl<S> IgnoreElementsOp<S> {
  #[inline]
  pub(crate) fn new(source: S) -> Self { IgnoreElementsOp { source } }
}

impl<Item, Err, O, S> Observable<Item, Err, O> for IgnoreElementsOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, IgnoreElementsObserver<O>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(IgnoreElementsObserver(observer))
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for IgnoreElementsOp<S> where
  S: ObservableExt<Item, Err>
{
}

pub struct IgnoreElementsObserver<O>(O);

impl<Item, Err, O> Observer<Item, Err> for IgnoreElementsObserver<O>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, _: Item) {}

  #[inline]
  fn error(self, err: Err) { self.0.error(err) }

  #[inline]
  fn complete(self) { self.0.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.0.is_finished() }
}
