use std::fmt::Display;

use tracing::debug;

use crate::{prelude::*, type_hint::TypeHint};

#[derive(Clone)]
pub struct TryMapOp<S, F, Item, Err> {
  source: S,
  func: F,
  _hint: TypeHint<(Item, Err)>,
}

impl<S, F, Item, Err> TryMapOp<S, F, Item, Err> {
  #[inline]
  pub(crate) fn new(source: S, func: F) -> Self {
    TryMapOp { source, func, _hint: TypeHint::new() }
  }
}

impl<Item, B, E, Err, O, S, F> Observable<B, RxError, O>
  for TryMapOp<S, F, Item, Err>
where
  O: Observer<B, RxError>,
  S: Observable<Item, Err, TryMapObserver<O, F>>,
  S::Unsub: Send + 'static,
  F: FnMut(Item) -> Result<B, E>,
  E: Display,
  Err: Into<RxError>,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SerialSubscription::default();
    let unsub = self.source.actual_subscribe(TryMapObserver {
      observer: Some(observer),
      func: self.func,
      upstream: upstream.clone(),
    });
    upstream.replace(unsub);
    upstream
  }
}

impl<Item, B, E, Err, S, F> ObservableExt<B, RxError>
  for TryMapOp<S, F, Item, Err>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(Item) -> Result<B, E>,
{
}

pub struct TryMapObserver<O, F> {
  observer: Option<O>,
  func: F,
  upstream: SerialSubscription,
}

impl<Item, B, E, Err, O, F> Observer<Item, Err> for TryMapObserver<O, F>
where
  O: Observer<B, RxError>,
  F: FnMut(Item) -> Result<B, E>,
  E: Display,
  Err: Into<RxError>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match (self.func)(value) {
      Ok(v) => {
        if let Some(observer) = self.observer.as_mut() {
          observer.next(v);
        }
      }
      Err(e) => {
        debug!(error = %e, "try_map transform failed");
        if let Some(observer) = self.observer.take() {
          observer.error(RxError::TransformFailure(e.to_string()));
        }
        self.upstream.clone().unsubscribe();
      }
    }
  }

  fn error(self, err: Err) {
    if let Some(observer) = self.observer {
      observer.error(err.into());
    }
  }

  fn complete(self) {
    if let Some(observer) = self.observer {
      observer.complete();
    }
  }

  fn is_finished(&self) -> bool {
    self.observer.as_ref().map_or(true, |o| o.is_finished())
  }
}
