//! Subjects are observers and observables at once: every value pushed in is
//! fanned out to the observers currently subscribed.
//!
//! A single [`Subject`] type carries the fan-out and the terminal state
//! machine; a [`Retention`] policy decides what late subscribers get to see.

use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
  },
};

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::{
  observer::BoxedObserver,
  prelude::*,
  rc::{MutArc, RcDeref, RcDerefMut},
};

mod async_subject;
mod behavior;
mod publish;
mod relay;
mod replay;

pub use async_subject::*;
pub use behavior::*;
pub use publish::*;
pub use relay::*;
pub use replay::*;

/// What a subject keeps from the values pushed through it.
pub trait Retention<Item> {
  /// Records a pushed value. Returns `false` when current observers should
  /// not see it yet.
  fn record(&mut self, value: &Item) -> bool;

  /// Values a new observer receives while the subject is active.
  fn replay(&self) -> Vec<Item>;

  /// Values delivered to every observer right before completion.
  fn on_complete(&self) -> Vec<Item> { Vec::new() }

  /// Values a new observer receives after the subject terminated, ahead of
  /// the terminal event.
  fn replay_terminated(&self, completed: bool) -> Vec<Item>;
}

enum Stage<Err> {
  Active,
  Completed,
  Errored(Err),
}

struct Slot<Item, Err> {
  closed: AtomicBool,
  observer: Mutex<Option<BoxedObserver<'static, Item, Err>>>,
}

impl<Item, Err> Slot<Item, Err> {
  fn lock(&self) -> std::sync::MutexGuard<'_, Option<BoxedObserver<'static, Item, Err>>> {
    self.observer.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

type Observers<Item, Err> = SmallVec<[Arc<Slot<Item, Err>>; 2]>;

struct SubjectCore<Item, Err, R> {
  observers: Observers<Item, Err>,
  stage: Stage<Err>,
  retention: R,
}

/// A multicasting observable, parameterised by its [`Retention`] policy.
///
/// Handles are cheap to clone and every clone drives the same subject.
/// Pushing after a terminal event is ignored, and a subscriber added during
/// a fan-out does not see the in-flight value.
///
/// Deliveries to one observer are serialized. An observer must not push
/// into or terminate the subject it is subscribed to from inside its own
/// callbacks; that deadlocks.
pub struct Subject<Item, Err, R> {
  core: MutArc<SubjectCore<Item, Err, R>>,
}

impl<Item, Err, R> Clone for Subject<Item, Err, R> {
  fn clone(&self) -> Self { Subject { core: self.core.clone() } }
}

impl<Item, Err, R> Subject<Item, Err, R> {
  pub(crate) fn with_retention(retention: R) -> Self {
    Subject {
      core: MutArc::own(SubjectCore {
        observers: SmallVec::new(),
        stage: Stage::Active,
        retention,
      }),
    }
  }

  pub(crate) fn retention<T>(&self, f: impl FnOnce(&R) -> T) -> T {
    f(&self.core.rc_deref().retention)
  }

  /// Number of observers currently subscribed.
  pub fn observer_count(&self) -> usize { self.core.rc_deref().observers.len() }

  /// `true` once the subject completed or errored.
  pub fn is_stopped(&self) -> bool {
    !matches!(self.core.rc_deref().stage, Stage::Active)
  }
}

impl<Item, Err, R> Subject<Item, Err, R>
where
  Item: Clone,
  Err: Clone,
  R: Retention<Item>,
{
  pub(crate) fn push(&self, value: Item) {
    let observers = {
      let mut core = self.core.rc_deref_mut();
      if !matches!(core.stage, Stage::Active) || !core.retention.record(&value) {
        return;
      }
      core.observers.clone()
    };
    for slot in observers.iter() {
      let mut observer = slot.lock();
      if slot.closed.load(Ordering::Acquire) {
        continue;
      }
      if let Some(observer) = observer.as_mut() {
        observer.next(value.clone());
      }
    }
  }

  fn terminate(&self, stage: Stage<Err>) {
    let (observers, err, before_complete) = {
      let mut core = self.core.rc_deref_mut();
      if !matches!(core.stage, Stage::Active) {
        return;
      }
      let (err, before_complete) = match &stage {
        Stage::Errored(err) => (Some(err.clone()), Vec::new()),
        _ => (None, core.retention.on_complete()),
      };
      core.stage = stage;
      (std::mem::take(&mut core.observers), err, before_complete)
    };
    debug!(observers = observers.len(), errored = err.is_some(), "subject terminated");
    for slot in observers {
      let observer = slot.lock().take();
      if slot.closed.swap(true, Ordering::AcqRel) {
        continue;
      }
      let Some(mut observer) = observer else { continue };
      match &err {
        Some(err) => observer.error(err.clone()),
        None => {
          for v in before_complete.iter().cloned() {
            observer.next(v);
          }
          observer.complete();
        }
      }
    }
  }
}

impl<Item, Err, R> Observer<Item, Err> for Subject<Item, Err, R>
where
  Item: Clone,
  Err: Clone,
  R: Retention<Item>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.push(value) }

  #[inline]
  fn error(self, err: Err) { self.terminate(Stage::Errored(err)) }

  #[inline]
  fn complete(self) { self.terminate(Stage::Completed) }

  #[inline]
  fn is_finished(&self) -> bool { self.is_stopped() }
}

impl<Item, Err, R, O> Observable<Item, Err, O> for Subject<Item, Err, R>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: Clone + 'static,
  Err: Clone + 'static,
  R: Retention<Item>,
{
  type Unsub = SubjectSubscription<Item, Err, R>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let slot = Arc::new(Slot {
      closed: AtomicBool::new(false),
      observer: Mutex::new(None),
    });
    let mut core = self.core.rc_deref_mut();
    let terminal = match &core.stage {
      Stage::Active => None,
      Stage::Completed => Some(None),
      Stage::Errored(err) => Some(Some(err.clone())),
    };
    match terminal {
      None => {
        // Pushes from other threads see the new slot right away but wait on
        // its lock until the replay below went out.
        let mut guard = slot.lock();
        core.observers.push(slot.clone());
        let replay = core.retention.replay();
        drop(core);
        trace!(replay = replay.len(), "subject subscribe");
        let mut observer: BoxedObserver<'static, Item, Err> = Box::new(observer);
        for v in replay {
          observer.next(v);
        }
        *guard = Some(observer);
      }
      Some(err) => {
        let replay = core.retention.replay_terminated(err.is_none());
        drop(core);
        trace!(errored = err.is_some(), "subscribe to terminated subject");
        let mut observer = observer;
        for v in replay {
          observer.next(v);
        }
        match err {
          Some(err) => observer.error(err),
          None => observer.complete(),
        }
        slot.closed.store(true, Ordering::Release);
      }
    }
    SubjectSubscription { core: self.core, slot }
  }
}

impl<Item, Err, R> ObservableExt<Item, Err> for Subject<Item, Err, R> {}

impl<Item, Err, R> Debug for Subject<Item, Err, R> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subject")
      .field("observer_count", &self.observer_count())
      .field("is_stopped", &self.is_stopped())
      .finish()
  }
}

/// Removes one observer from its subject.
pub struct SubjectSubscription<Item, Err, R> {
  core: MutArc<SubjectCore<Item, Err, R>>,
  slot: Arc<Slot<Item, Err>>,
}

impl<Item, Err, R> Subscription for SubjectSubscription<Item, Err, R> {
  fn unsubscribe(self) {
    if self.slot.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    trace!("subject unsubscribe");
    self
      .core
      .rc_deref_mut()
      .observers
      .retain(|s| !Arc::ptr_eq(s, &self.slot));
  }

  #[inline]
  fn is_closed(&self) -> bool { self.slot.closed.load(Ordering::Acquire) }
}
