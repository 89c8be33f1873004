use crate::prelude::*;

#[derive(Clone)]
pub struct LastOp<S, Item> {
  source: S,
  last: Option<Item>,
}

impl<S, Item> LastOp<S, Item> {
  #[inline]
  pub(crate) fn new(source: S, default: Option<Item>) -> Self {
    LastOp { source, last: default }
  }
}

impl<Item, S, Err, O> Observable<Item, Err, O> for LastOp<S, Item>
where
  S: Observable<Item, Err, LastObserver<O, Item>>,
  O: Observer<Item, Err>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(LastObserver { observer, last: self.last })
  }
}

impl<Item, S, Err> ObservableExt<Item, Err> for LastOp<S, Item> where
  S: ObservableExt<Item, Err>
{
}

pub struct LastObserver<O, Item> {
  observer: O,
  last: Option<Item>,
}

impl<O, Item, Err> Observer<Item, Err> for LastObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.last = Some(value); }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    if let Some(v) = self.last.take() {
      self.observer.next(v)
    }
    self.observer.complete();
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn last_or_hundred_items() {
    let mut completed = 0;
    let mut last_item = None;

    observable::from_iter(0..100)
      .last_or(200)
      .on_complete(|| completed += 1)
      .subscribe(|v| last_item = Some(v));

    assert_eq!(completed, 1);
    assert_eq!(Some(99), last_item);
  }

  #[test]
  fn last_or_no_items() {
    let mut completed = 0;
    let mut last_item = None;

    observable::empty()
      .last_or(100)
      .on_complete(|| completed += 1)
      .subscribe(|v| last_item = Some(v));

    assert_eq!(completed, 1);
    assert_eq!(Some(100), last_item);
  }

  #[test]
  fn last_no_items() {
    let mut completed = 0;
    let mut last_item = None;

    observable::empty()
      .last()
      .on_complete(|| completed += 1)
      .subscribe(|v: i32| last_item = Some(v));

    assert_eq!(completed, 1);
    assert_eq!(None, last_item);
  }

  #[test]
  fn last_on_error_emits_nothing() {
    let mut last_item = None;
    let mut errors = 0;
    observable::throw::<i32, _>(())
      .last()
      .on_error(|_| errors += 1)
      .subscribe(|v| last_item = Some(v));
    assert_eq!(errors, 1);
    assert_eq!(last_item, None);
  }
}
