use crate::prelude::*;

#[derive(Clone)]
pub struct FilterOp<S, F> {
  source: S,
  filter: F,
}

impl<S, F> FilterOp<S, F> {
  #[inline]
  pub(crate) fn new(source: S, filter: F) -> Self { FilterOp { source, filter } }
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for FilterOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, FilterObserver<O, F>>,
  F: FnMut(&Item) -> bool,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(FilterObserver { observer, filter: self.filter })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for FilterOp<S, F> where
  S: ObservableExt<Item, Err>
{
}

pub struct FilterObserver<O, F> {
  observer: O,
  filter: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for FilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if (self.filter)(&value) {
      self.observer.next(value)
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn keeps_matching_values() {
    let mut evens = vec![];
    observable::from_iter(0..10)
      .filter(|v| v % 2 == 0)
      .subscribe(|v| evens.push(v));
    assert_eq!(evens, vec![0, 2, 4, 6, 8]);
  }

  #[test]
  fn passes_terminal_events() {
    let mut completed = false;
    let mut hits = 0;
    observable::from_iter(0..10)
      .filter(|_| false)
      .on_complete(|| completed = true)
      .subscribe(|_| hits += 1);
    assert_eq!(hits, 0);
    assert!(completed);
  }
}
