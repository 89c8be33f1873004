use std::{
  convert::Infallible,
  iter::{Repeat, Take},
};

use crate::prelude::*;

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted, or stops early once the
/// observer reports it is finished. Never emits an error.
///
/// ```
/// use rxkit::prelude::*;
///
/// observable::from_iter(vec![0, 1, 2, 3]).subscribe(|v| println!("{},", v));
/// ```
pub fn from_iter<Iter>(iter: Iter) -> ObservableIter<Iter>
where
  Iter: IntoIterator,
{
  ObservableIter(iter)
}

#[derive(Clone)]
pub struct ObservableIter<Iter>(Iter);

impl<O, Iter> Observable<Iter::Item, Infallible, O> for ObservableIter<Iter>
where
  Iter: IntoIterator,
  O: Observer<Iter::Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    let mut iter = self.0.into_iter();
    while !observer.is_finished() {
      match iter.next() {
        Some(v) => observer.next(v),
        None => return observer.complete(),
      }
    }
  }
}

impl<Iter> ObservableExt<Iter::Item, Infallible> for ObservableIter<Iter> where
  Iter: IntoIterator
{
}

/// Creates an observable producing the same value `n` times.
///
/// ```
/// use rxkit::prelude::*;
///
/// observable::repeat(123, 3).subscribe(|v| println!("{},", v));
/// // 123
/// // 123
/// // 123
/// ```
pub fn repeat<Item>(v: Item, n: usize) -> ObservableIter<Take<Repeat<Item>>>
where
  Item: Clone,
{
  from_iter(std::iter::repeat(v).take(n))
}
