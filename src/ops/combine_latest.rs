use crate::{
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
  type_hint::TypeHint,
};

pub struct CombineLatestOp<A, B, F, Items> {
  a: A,
  b: B,
  binary_op: F,
  _hint: TypeHint<Items>,
}

impl<A: Clone, B: Clone, F: Clone, Items> Clone for CombineLatestOp<A, B, F, Items> {
  fn clone(&self) -> Self {
    CombineLatestOp {
      a: self.a.clone(),
      b: self.b.clone(),
      binary_op: self.binary_op.clone(),
      _hint: TypeHint::new(),
    }
  }
}

impl<A, B, F, Items> CombineLatestOp<A, B, F, Items> {
  #[inline]
  pub(crate) fn new(a: A, b: B, binary_op: F) -> Self {
    CombineLatestOp { a, b, binary_op, _hint: TypeHint::new() }
  }
}

pub struct CombineState<O, ItemA, ItemB, F> {
  observer: Option<O>,
  a: Option<ItemA>,
  b: Option<ItemB>,
  binary_op: F,
  completed_one: bool,
}

type SharedState<O, ItemA, ItemB, F> = MutArc<CombineState<O, ItemA, ItemB, F>>;

impl<O, ItemA, ItemB, F> CombineState<O, ItemA, ItemB, F> {
  fn emit<Out, Err>(&mut self)
  where
    O: Observer<Out, Err>,
    F: FnMut(ItemA, ItemB) -> Out,
    ItemA: Clone,
    ItemB: Clone,
  {
    if let (Some(a), Some(b), Some(observer)) = (&self.a, &self.b, self.observer.as_mut()) {
      let out = (self.binary_op)(a.clone(), b.clone());
      observer.next(out);
    }
  }
}

fn complete_one<O, ItemA, ItemB, F, Out, Err>(
  state: &SharedState<O, ItemA, ItemB, F>,
  subscription: &MultiSubscription,
) where
  O: Observer<Out, Err>,
{
  let observer = {
    let mut state = state.rc_deref_mut();
    if state.completed_one {
      state.observer.take()
    } else {
      state.completed_one = true;
      None
    }
  };
  if let Some(observer) = observer {
    observer.complete();
    subscription.clone().unsubscribe();
  }
}

fn fail<O, ItemA, ItemB, F, Out, Err>(
  state: &SharedState<O, ItemA, ItemB, F>,
  subscription: &MultiSubscription,
  err: Err,
) where
  O: Observer<Out, Err>,
{
  let observer = state.rc_deref_mut().observer.take();
  if let Some(observer) = observer {
    observer.error(err);
  }
  subscription.clone().unsubscribe();
}

impl<ItemA, ItemB, Out, Err, O, A, B, F> Observable<Out, Err, O>
  for CombineLatestOp<A, B, F, (ItemA, ItemB)>
where
  O: Observer<Out, Err>,
  A: Observable<ItemA, Err, CombineAObserver<O, ItemA, ItemB, F, Out>>,
  A::Unsub: Send + 'static,
  B: Observable<ItemB, Err, CombineBObserver<O, ItemA, ItemB, F, Out>>,
  B::Unsub: Send + 'static,
  F: FnMut(ItemA, ItemB) -> Out,
  ItemA: Clone,
  ItemB: Clone,
{
  type Unsub = MultiSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let subscription = MultiSubscription::default();
    let state = MutArc::own(CombineState {
      observer: Some(observer),
      a: None,
      b: None,
      binary_op: self.binary_op,
      completed_one: false,
    });
    let unsub = self.a.actual_subscribe(CombineAObserver {
      state: state.clone(),
      subscription: subscription.clone(),
      _hint: TypeHint::new(),
    });
    subscription.append(unsub);
    let unsub = self.b.actual_subscribe(CombineBObserver {
      state,
      subscription: subscription.clone(),
      _hint: TypeHint::new(),
    });
    subscription.append(unsub);
    subscription
  }
}

impl<ItemA, ItemB, Out, Err, A, B, F> ObservableExt<Out, Err>
  for CombineLatestOp<A, B, F, (ItemA, ItemB)>
where
  A: ObservableExt<ItemA, Err>,
  B: ObservableExt<ItemB, Err>,
  F: FnMut(ItemA, ItemB) -> Out,
{
}

pub struct CombineAObserver<O, ItemA, ItemB, F, Out> {
  state: SharedState<O, ItemA, ItemB, F>,
  subscription: MultiSubscription,
  _hint: TypeHint<Out>,
}

pub struct CombineBObserver<O, ItemA, ItemB, F, Out> {
  state: SharedState<O, ItemA, ItemB, F>,
  subscription: MultiSubscription,
  _hint: TypeHint<Out>,
}

macro_rules! impl_combine_observer {
  ($name: ident, $item: ident, $slot: ident) => {
    impl<ItemA, ItemB, Out, Err, O, F> Observer<$item, Err>
      for $name<O, ItemA, ItemB, F, Out>
    where
      O: Observer<Out, Err>,
      F: FnMut(ItemA, ItemB) -> Out,
      ItemA: Clone,
      ItemB: Clone,
    {
      fn next(&mut self, value: $item) {
        if self.subscription.is_closed() {
          return;
        }
        let mut state = self.state.rc_deref_mut();
        state.$slot = Some(value);
        state.emit::<Out, Err>();
      }

      fn error(self, err: Err) {
        fail::<O, ItemA, ItemB, F, Out, Err>(&self.state, &self.subscription, err)
      }

      fn complete(self) {
        complete_one::<O, ItemA, ItemB, F, Out, Err>(&self.state, &self.subscription)
      }

      fn is_finished(&self) -> bool {
        self.state.rc_deref().observer.as_ref().map_or(true, |o| o.is_finished())
      }
    }
  };
}

impl_combine_observer!(CombineAObserver, ItemA, a);
impl_combine_observer!(CombineBObserver, ItemB, b);
