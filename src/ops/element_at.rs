use tracing::debug;

use crate::{prelude::*, type_hint::TypeHint};

#[derive(Clone)]
pub struct ElementAtOp<S, Err> {
  source: S,
  index: usize,
  _hint: TypeHint<Err>,
}

impl<S, Err> ElementAtOp<S, Err> {
  #[inline]
  pub(crate) fn new(source: S, index: usize) -> Self {
    ElementAtOp { source, index, _hint: TypeHint::new() }
  }
}

impl<Item, Err, O, S> Observable<Item, RxError, O> for ElementAtOp<S, Err>
where
  O: Observer<Item, RxError>,
  S: Observable<Item, Err, ElementAtObserver<O>>,
  S::Unsub: Send + 'static,
  Err: Into<RxError>,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SerialSubscription::default();
    let unsub = self.source.actual_subscribe(ElementAtObserver {
      observer: Some(observer),
      index: self.index,
      seen: 0,
      upstream: upstream.clone(),
    });
    upstream.replace(unsub);
    upstream
  }
}

impl<Item, Err, S> ObservableExt<Item, RxError> for ElementAtOp<S, Err> where
  S: ObservableExt<Item, Err>
{
}

pub struct ElementAtObserver<O> {
  observer: Option<O>,
  index: usize,
  seen: usize,
  upstream: SerialSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for ElementAtObserver<O>
where
  O: Observer<Item, RxError>,
  Err: Into<RxError>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    if self.seen == self.index {
      if let Some(mut observer) = self.observer.take() {
        observer.next(value);
        observer.complete();
      }
      self.upstream.clone().unsubscribe();
    }
    self.seen += 1;
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err.into())
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      debug!(index = self.index, count = self.seen, "element_at ran out of values");
      observer.error(RxError::InsufficientElements { index: self.index, count: self.seen })
    }
  }

  fn is_finished(&self) -> bool {
    self.observer.as_ref().map_or(true, |o| o.is_finished())
  }
}

#[cfg(test)]
mod test {
  use crate::prelude::*;

  #[test]
  fn emits_value_at_index() {
    let mut values = vec![];
    let mut completed = false;
    observable::from_iter(10..20)
      .element_at(3)
      .subscribe_all(|v| values.push(v), |_| {}, || completed = true);
    assert_eq!(values, vec![13]);
    assert!(completed);
  }

  #[test]
  fn short_source_fails() {
    let mut error = None;
    observable::of([1, 2, 3])
      .element_at(3)
      .subscribe_all(|_| {}, |e| error = Some(e), || {});
    assert_eq!(error, Some(RxError::InsufficientElements { index: 3, count: 3 }));
  }

  #[test]
  fn upstream_error_is_forwarded() {
    let mut error = None;
    observable::throw::<i32, _>(RxError::upstream("lost"))
      .element_at(0)
      .subscribe_all(|_| {}, |e| error = Some(e), || {});
    assert_eq!(error, Some(RxError::Upstream("lost".into())));
  }
}
