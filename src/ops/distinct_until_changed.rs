use crate::prelude::*;

#[derive(Clone)]
pub struct DistinctUntilChangedOp<S> {
  source: S,
}

impl<S> DistinctUntilChangedOp<S> {
  #[inline]
  pub(crate) fn new(source: S) -> Self { DistinctUntilChangedOp { source } }
}

impl<Item, Err, O, S> Observable<Item, Err, O> for DistinctUntilChangedOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, DistinctUntilChangedObserver<O, Item>>,
  Item: PartialEq + Clone,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(DistinctUntilChangedObserver { observer, last: None })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for DistinctUntilChangedOp<S> where
  S: ObservableExt<Item, Err>
{
}

pub struct DistinctUntilChangedObserver<O, Item> {
  observer: O,
  last: Option<Item>,
}

impl<Item, Err, O> Observer<Item, Err> for DistinctUntilChangedObserver<O, Item>
where
  O: Observer<Item, Err>,
  Item: PartialEq + Clone,
{
  fn next(&mut self, value: Item) {
    if self.last.as_ref() != Some(&value) {
      self.last = Some(value.clone());
      self.observer.next(value);
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
  fn drops_consecutive_duplicates() {
    let mut x = vec![];
    observable::from_iter([1, 2, 2, 3, 3, 3, 4, 4, 5])
      .distinct_until_changed()
      .subscribe(|v| x.push(v));
    assert_eq!(x, vec![1, 2, 3, 4, 5]);
  }

  #[test]
  fn repeats_after_a_change_pass() {
    let mut x = vec![];
    observable::from_iter(["a", "a", "b", "a"])
      .distinct_until_changed()
      .subscribe(|v| x.push(v));
    assert_eq!(x, vec!["a", "b", "a"]);
  }
}
