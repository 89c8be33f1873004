use crate::{
  ops::merge_all::{InnerObserver, OuterObserver},
  prelude::*,
};

#[derive(Clone)]
pub struct MergeOp<S1, S2> {
  source1: S1,
  source2: S2,
}

impl<S1, S2> MergeOp<S1, S2> {
  #[inline]
  pub(crate) fn new(source1: S1, source2: S2) -> Self { MergeOp { source1, source2 } }
}

impl<Item, Err, O, S1, S2> Observable<Item, Err, O> for MergeOp<S1, S2>
where
  O: Observer<Item, Err> + Send + 'static,
  S1: Observable<Item, Err, InnerObserver<O>>,
  S1::Unsub: Send + 'static,
  S2: Observable<Item, Err, InnerObserver<O>>,
  S2::Unsub: Send + 'static,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let outer = OuterObserver::<O, Item>::new(observer, usize::MAX);
    let subscription = outer.subscription().clone();
    outer.subscribe_now::<Err, _>(self.source1);
    if !outer.finished::<Err>() {
      outer.subscribe_now::<Err, _>(self.source2);
    }
    outer.finish::<Err>();
    subscription
  }
}

impl<Item, Err, S1, S2> ObservableExt<Item, Err> for MergeOp<S1, S2>
where
  S1: ObservableExt<Item, Err>,
  S2: ObservableExt<Item, Err>,
{
}
