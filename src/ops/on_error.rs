use std::convert::Infallible;

use crate::{prelude::*, type_hint::TypeHint};

pub struct OnErrorOp<S, F, Err> {
  source: S,
  func: F,
  _hint: TypeHint<Err>,
}

impl<S, F, Err> OnErrorOp<S, F, Err> {
  #[inline]
  pub(crate) fn new(source: S, func: F) -> Self {
    OnErrorOp { source, func, _hint: TypeHint::new() }
  }
}

impl<S: Clone, F: Clone, Err> Clone for OnErrorOp<S, F, Err> {
  fn clone(&self) -> Self { Self::new(self.source.clone(), self.func.clone()) }
}

impl<S, F, Item, Err, O> Observable<Item, Infallible, O> for OnErrorOp<S, F, Err>
where
  O: Observer<Item, Infallible>,
  S: Observable<Item, Err, OnErrorObserver<O, F>>,
  F: FnOnce(Err),
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(OnErrorObserver { observer, func: self.func })
  }
}

impl<S, F, Item, Err> ObservableExt<Item, Infallible> for OnErrorOp<S, F, Err> where
  S: ObservableExt<Item, Err>
{
}

pub struct OnErrorObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for OnErrorObserver<O, F>
where
  O: Observer<Item, Infallible>,
  F: FnOnce(Err),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  #[inline]
  fn error(self, err: Err) { (self.func)(err); }

  #[inline]
  fn complete(self) { self.observer.complete(); }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
