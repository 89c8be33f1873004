use std::convert::Infallible;

use crate::{prelude::*, type_hint::TypeHint};

/// Creates an observable that emits no items, just terminates with an error.
pub fn throw<Item, Err>(err: Err) -> ObservableThrow<Item, Err> {
  ObservableThrow { err, _hint: TypeHint::new() }
}

#[derive(Clone)]
pub struct ObservableThrow<Item, Err> {
  err: Err,
  _hint: TypeHint<Item>,
}

impl<Item, Err, O> Observable<Item, Err, O> for ObservableThrow<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub { observer.error(self.err) }
}

impl<Item, Err> ObservableExt<Item, Err> for ObservableThrow<Item, Err> {}

/// Creates an observable that produces no values and completes
/// immediately.
pub fn empty<Item>() -> ObservableEmpty<Item> { ObservableEmpty(TypeHint::new()) }

#[derive(Clone)]
pub struct ObservableEmpty<Item>(TypeHint<Item>);

impl<Item, O> Observable<Item, Infallible, O> for ObservableEmpty<Item>
where
  O: Observer<Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub { observer.complete() }
}

impl<Item> ObservableExt<Item, Infallible> for ObservableEmpty<Item> {}

/// Creates an observable that never emits anything: no value, no error, no
/// completion.
pub fn never<Item>() -> ObservableNever<Item> { ObservableNever(TypeHint::new()) }

#[derive(Clone)]
pub struct ObservableNever<Item>(TypeHint<Item>);

impl<Item, O> Observable<Item, Infallible, O> for ObservableNever<Item>
where
  O: Observer<Item, Infallible>,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, _: O) -> Self::Unsub { MultiSubscription::default() }
}

impl<Item> ObservableExt<Item, Infallible> for ObservableNever<Item> {}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn throw() {
    let mut value_emitted = false;
    let mut completed = false;
    let mut error_emitted = String::new();
    observable::throw(String::from("error")).subscribe_all(
      |_: ()| value_emitted = true,
      |e| error_emitted = e,
      || completed = true,
    );
    assert!(!value_emitted);
    assert!(!completed);
    assert_eq!(error_emitted, "error");
  }

  #[test]
  fn empty() {
    let mut hits = 0;
    let mut completed = false;
    observable::empty()
      .on_complete(|| completed = true)
      .subscribe(|()| hits += 1);

    assert_eq!(hits, 0);
    assert!(completed);
  }

  #[test]
  fn never_stays_open() {
    let mut hits = 0;
    let subscription = observable::never().subscribe(|()| hits += 1);
    assert!(!subscription.is_closed());
    subscription.unsubscribe();
    assert_eq!(hits, 0);
  }
}
