use crate::{
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
  type_hint::TypeHint,
};

#[derive(Clone)]
pub struct WithLatestFromOp<S, FS> {
  source: S,
  from: FS,
}

impl<S, FS> WithLatestFromOp<S, FS> {
  #[inline]
  pub(crate) fn new(source: S, from: FS) -> Self { WithLatestFromOp { source, from } }
}

impl<Source, From, O, ItemA, ItemB, Err> Observable<(ItemA, ItemB), Err, O>
  for WithLatestFromOp<Source, From>
where
  O: Observer<(ItemA, ItemB), Err>,
  Source: Observable<ItemA, Err, AObserver<O, ItemB>>,
  Source::Unsub: Send + 'static,
  From: Observable<ItemB, Err, BObserver<O, ItemA, ItemB>>,
  From::Unsub: Send + 'static,
  ItemB: Clone,
{
  type Unsub = ZipSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let latest = MutArc::own(None);
    let observer = MutArc::own(Some(observer));
    let source_unsub = SerialSubscription::default();
    let from_unsub = SerialSubscription::default();

    // `from` goes first so a synchronous value is already there when the
    // source starts
    let unsub = self.from.actual_subscribe(BObserver {
      observer: observer.clone(),
      latest: latest.clone(),
      source: source_unsub.clone(),
      _hint: TypeHint::new(),
    });
    from_unsub.replace(unsub);
    let unsub = self.source.actual_subscribe(AObserver {
      observer,
      latest,
      from: from_unsub.clone(),
    });
    source_unsub.replace(unsub);

    ZipSubscription::new(source_unsub, from_unsub)
  }
}

impl<Source, From, ItemA, ItemB, Err> ObservableExt<(ItemA, ItemB), Err>
  for WithLatestFromOp<Source, From>
where
  Source: ObservableExt<ItemA, Err>,
  From: ObservableExt<ItemB, Err>,
{
}

pub struct BObserver<O, ItemA, ItemB> {
  observer: MutArc<Option<O>>,
  latest: MutArc<Option<ItemB>>,
  source: SerialSubscription,
  _hint: TypeHint<ItemA>,
}

impl<O, ItemA, ItemB, Err> Observer<ItemB, Err> for BObserver<O, ItemA, ItemB>
where
  O: Observer<(ItemA, ItemB), Err>,
{
  #[inline]
  fn next(&mut self, value: ItemB) { *self.latest.rc_deref_mut() = Some(value); }

  fn error(self, err: Err) {
    self.observer.error(err);
    self.source.unsubscribe();
  }

  // the source alone decides when the result completes
  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}

pub struct AObserver<O, ItemB> {
  observer: MutArc<Option<O>>,
  latest: MutArc<Option<ItemB>>,
  from: SerialSubscription,
}

impl<ItemA, ItemB, Err, O> Observer<ItemA, Err> for AObserver<O, ItemB>
where
  O: Observer<(ItemA, ItemB), Err>,
  ItemB: Clone,
{
  fn next(&mut self, item: ItemA) {
    let latest = self.latest.rc_deref().clone();
    if let Some(latest) = latest {
      self.observer.next((item, latest));
    }
  }

  fn complete(self) {
    self.observer.complete();
    self.from.unsubscribe();
  }

  fn error(self, err: Err) {
    self.observer.error(err);
    self.from.unsubscribe();
  }

  #[inline]
  fn is_finished(&self) -> bool { self.observer.is_finished() }
}
