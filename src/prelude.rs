//! Everything needed to build and subscribe streams.

pub use crate::{
  error::RxError,
  executor::*,
  observable::{
    self, CombineLatestSources, CreateSubscription, Emitter, IntervalObservable, MergeSources,
    Observable, ObservableCreate, ObservableEmpty, ObservableExt, ObservableIter,
    ObservableJust, ObservableNever, ObservableThrow, TimerObservable, ZipSources,
  },
  observer::{BoxedObserver, DynObserver, FnMutObserver, Observer, ObserverAll},
  ops::WindowObservable,
  subject::*,
  subscription::*,
};
