use crate::{prelude::*, type_hint::TypeHint};

#[derive(Clone)]
pub struct MapOp<S, F, Item> {
  source: S,
  func: F,
  _hint: TypeHint<Item>,
}

impl<S, F, Item> MapOp<S, F, Item> {
  #[inline]
  pub(crate) fn new(source: S, func: F) -> Self {
    MapOp { source, func, _hint: TypeHint::new() }
  }
}

impl<Item, B, Err, O, S, F> Observable<B, Err, O> for MapOp<S, F, Item>
where
  O: Observer<B, Err>,
  S: Observable<Item, Err, MapObserver<O, F>>,
  F: FnMut(Item) -> B,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(MapObserver { observer, map: self.func })
  }
}

impl<Item, B, Err, S, F> ObservableExt<B, Err> for MapOp<S, F, Item>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(Item) -> B,
{
}

#[derive(Clone)]
pub struct MapObserver<O, F> {
  observer: O,
  map: F,
}

impl<Item, B, Err, O, F> Observer<Item, Err> for MapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> B,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next((self.map)(value)) }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
