use crate::prelude::*;

#[derive(Clone)]
pub struct TakeOp<S> {
  source: S,
  count: usize,
}

impl<S> TakeOp<S> {
  #[inline]
  pub(crate) fn new(source: S, count: usize) -> Self { TakeOp { source, count } }
}

impl<Item, Err, O, S> Observable<Item, Err, O> for TakeOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, TakeObserver<O>>,
  S::Unsub: Send + 'static,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SerialSubscription::default();
    if self.count == 0 {
      observer.complete();
      upstream.clone().unsubscribe();
      return upstream;
    }
    let unsub = self.source.actual_subscribe(TakeObserver {
      observer: Some(observer),
      remaining: self.count,
      upstream: upstream.clone(),
    });
    upstream.replace(unsub);
    upstream
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for TakeOp<S> where
  S: ObservableExt<Item, Err>
{
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
  upstream: SerialSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    let Some(observer) = self.observer.as_mut() else { return };
    self.remaining -= 1;
    observer.next(value);
    if self.remaining == 0 {
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
