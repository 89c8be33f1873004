use crate::prelude::*;
use crate::type_hint::TypeHint;

#[derive(Clone)]
pub struct MapErrOp<S, F, Err> {
  source: S,
  func: F,
  _hint: TypeHint<Err>,
}

impl<S, F, Err> MapErrOp<S, F, Err> {
  #[inline]
  pub(crate) fn new(source: S, func: F) -> Self {
    MapErrOp { source, func, _hint: TypeHint::new() }
  }
}

impl<Item, Err, B, O, S, F> Observable<Item, B, O> for MapErrOp<S, F, Err>
where
  O: Observer<Item, B>,
  S: Observable<Item, Err, MapErrObserver<O, F>>,
  F: FnOnce(Err) -> B,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(MapErrObserver { observer, map: self.func })
  }
}

impl<Item, Err, B, S, F> ObservableExt<Item, B> for MapErrOp<S, F, Err>
where
  S: ObservableExt<Item, Err>,
  F: FnOnce(Err) -> B,
{
}

pub struct MapErrObserver<O, F> {
  observer: O,
  map: F,
}

impl<Item, Err, B, O, F> Observer<Item, Err> for MapErrObserver<O, F>
where
  O: Observer<Item, B>,
  F: FnOnce(Err) -> B,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  #[inline]
  fn error(self, err: Err) { self.observer.error((self.map)(err)) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn map_err() {
    let mut err_msg = String::new();
    observable::throw::<i32, _>(404)
      .map_err(|code| format!("status {}", code))
      .on_error(|e| err_msg = e)
      .subscribe(|_| {});
    assert_eq!(err_msg, "status 404");
  }
}
