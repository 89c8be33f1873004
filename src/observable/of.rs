use std::convert::Infallible;

use crate::prelude::*;

use super::from_iter;

/// Creates an observable that emits a fixed sequence of values in order,
/// synchronously, then completes.
///
/// ```
/// use rxkit::prelude::*;
///
/// observable::of([1, 2, 3]).subscribe(|v| println!("{}", v));
/// ```
#[inline]
pub fn of<Iter>(values: Iter) -> ObservableIter<Iter>
where
  Iter: IntoIterator,
{
  from_iter(values)
}

/// Creates an observable that emits a single value, then completes.
#[inline]
pub fn just<Item>(value: Item) -> ObservableJust<Item> { ObservableJust(value) }

#[derive(Clone)]
pub struct ObservableJust<Item>(Item);

impl<Item, O> Observable<Item, Infallible, O> for ObservableJust<Item>
where
  O: Observer<Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    observer.next(self.0);
    observer.complete();
  }
}

impl<Item> ObservableExt<Item, Infallible> for ObservableJust<Item> {}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn of_emits_in_order() {
    let mut values = vec![];
    let mut completed = false;
    observable::of(["a", "b", "c"])
      .on_complete(|| completed = true)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec!["a", "b", "c"]);
    assert!(completed);
  }

  #[test]
  fn just_is_the_one_element_case() {
    let mut values = vec![];
    let mut completed = 0;
    observable::just(100)
      .on_complete(|| completed += 1)
      .subscribe(|v| values.push(v));
    assert_eq!(values, vec![100]);
    assert_eq!(completed, 1);
  }
}
