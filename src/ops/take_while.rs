use crate::prelude::*;

#[derive(Clone)]
pub struct TakeWhileOp<S, F> {
  source: S,
  predicate: F,
}

impl<S, F> TakeWhileOp<S, F> {
  #[inline]
  pub(crate) fn new(source: S, predicate: F) -> Self { TakeWhileOp { source, predicate } }
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for TakeWhileOp<S, F>
where
  S: Observable<Item, Err, TakeWhileObserver<O, F>>,
  S::Unsub: Send + 'static,
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SerialSubscription::default();
    let unsub = self.source.actual_subscribe(TakeWhileObserver {
      observer: Some(observer),
      predicate: self.predicate,
      upstream: upstream.clone(),
    });
    upstream.replace(unsub);
    upstream
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for TakeWhileOp<S, F> where
  S: ObservableExt<Item, Err>
{
}

pub struct TakeWhileObserver<O, F> {
  observer: Option<O>,
  predicate: F,
  upstream: SerialSubscription,
}

impl<O, Item, Err, F> Observer<Item, Err> for TakeWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    if (self.predicate)(&value) {
      if let Some(observer) = self.observer.as_mut() {
        observer.next(value);
      }
    } else {
      if let Some(observer) = self.observer.take() {
        observer.complete();
      }
      self.upstream.clone().unsubscribe();
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err)
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete()
    }
  }

  fn is_finished(&self) -> bool {
    self.observer.as_ref().map_or(true, |o| o.is_finished())
  }
}
