use crate::{
  ops::merge_all::{InnerObserver, OuterObserver},
  prelude::*,
};

/// Subscribes to every source at once and interleaves their values as they
/// arrive. Completes once every source completed; the first error from any
/// source terminates the result and releases the others.
///
/// ```
/// use rxkit::prelude::*;
///
/// observable::merge([observable::of([1, 2]), observable::of([3, 4])])
///   .subscribe(|v| println!("{}", v));
/// ```
pub fn merge<I>(sources: I) -> MergeSources<I>
where
  I: IntoIterator,
{
  MergeSources(sources)
}

#[derive(Clone)]
pub struct MergeSources<I>(I);

impl<Item, Err, O, I> Observable<Item, Err, O> for MergeSources<I>
where
  O: Observer<Item, Err> + Send + 'static,
  I: IntoIterator,
  I::Item: Observable<Item, Err, InnerObserver<O>>,
  <I::Item as Observable<Item, Err, InnerObserver<O>>>::Unsub: Send + 'static,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let outer = OuterObserver::<O, Item>::new(observer, usize::MAX);
    let subscription = outer.subscription().clone();
    for source in self.0 {
      if outer.finished::<Err>() {
        break;
      }
      outer.subscribe_now::<Err, _>(source);
    }
    outer.finish::<Err>();
    subscription
  }
}

impl<Item, Err, I> ObservableExt<Item, Err> for MergeSources<I>
where
  I: IntoIterator,
  I::Item: ObservableExt<Item, Err>,
{
}

#[cfg(test)]
mod test {
  use crate::prelude::*;
  use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
  };

  #[test]
  fn merges_every_source() {
    let values = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));
    let (c_values, c_completed) = (values.clone(), completed.clone());

    observable::merge(vec![
      observable::of(vec![1, 2]),
      observable::of(vec![3]),
      observable::of(vec![]),
    ])
    .on_complete(move || *c_completed.lock().unwrap() = true)
    .subscribe(move |v| c_values.lock().unwrap().push(v));

    assert_eq!(*values.lock().unwrap(), vec![1, 2, 3]);
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn no_sources_completes_at_once() {
    let completed = Arc::new(Mutex::new(false));
    let c_completed = completed.clone();
    observable::merge(Vec::<ObservableEmpty<i32>>::new())
      .on_complete(move || *c_completed.lock().unwrap() = true)
      .subscribe(|_| {});
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn waits_for_the_slowest_source() {
    let values = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));
    let (c_values, c_completed) = (values.clone(), completed.clone());
    let mut a = PublishSubject::<i32, Infallible>::new();
    let mut b = PublishSubject::<i32, Infallible>::new();

    observable::merge([a.clone(), b.clone()])
      .on_complete(move || *c_completed.lock().unwrap() = true)
      .subscribe(move |v| c_values.lock().unwrap().push(v));

    a.next(1);
    b.next(2);
    a.complete();
    assert!(!*completed.lock().unwrap());
    b.next(3);
    b.complete();
    assert_eq!(*values.lock().unwrap(), vec![1, 2, 3]);
    assert!(*completed.lock().unwrap());
  }
}
