use crate::{prelude::*, type_hint::TypeHint};

#[derive(Clone)]
pub struct ScanOp<S, F, Acc, Item> {
  source: S,
  func: F,
  seed: Acc,
  _hint: TypeHint<Item>,
}

impl<S, F, Acc, Item> ScanOp<S, F, Acc, Item> {
  #[inline]
  pub(crate) fn new(source: S, seed: Acc, func: F) -> Self {
    ScanOp { source, func, seed, _hint: TypeHint::new() }
  }
}

impl<Item, Err, O, S, F, Acc> Observable<Acc, Err, O> for ScanOp<S, F, Acc, Item>
where
  O: Observer<Acc, Err>,
  S: Observable<Item, Err, ScanObserver<O, F, Acc>>,
  F: FnMut(Acc, Item) -> Acc,
  Acc: Clone,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(ScanObserver {
      observer,
      func: self.func,
      acc: Some(self.seed),
    })
  }
}

impl<Item, Err, S, F, Acc> ObservableExt<Acc, Err> for ScanOp<S, F, Acc, Item> where
  S: ObservableExt<Item, Err>
{
}

pub struct ScanObserver<O, F, Acc> {
  observer: O,
  func: F,
  acc: Option<Acc>,
}

impl<Item, Err, O, F, Acc> Observer<Item, Err> for ScanObserver<O, F, Acc>
where
  O: Observer<Acc, Err>,
  F: FnMut(Acc, Item) -> Acc,
  Acc: Clone,
{
  fn next(&mut self, value: Item) {
    if let Some(acc) = self.acc.take() {
      let acc = (self.func)(acc, value);
      self.acc = Some(acc.clone());
      self.observer.next(acc);
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
