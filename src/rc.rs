use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use crate::observer::Observer;

pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  fn rc_deref(&self) -> Self::Target<'_>;
}

pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  fn rc_deref_mut(&self) -> Self::Target<'_>;
}

/// A shared, lock-guarded cell. Every piece of state an operator shares
/// between its upstream observers lives behind one of these, so delivery
/// into the downstream observer is always serialized.
#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }

  /// Locks the cell only if nobody holds it right now, the current thread
  /// included.
  pub fn try_rc_deref_mut(&self) -> Option<MutexGuard<'_, T>> {
    match self.0.try_lock() {
      Ok(guard) => Some(guard),
      Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
      Err(TryLockError::WouldBlock) => None,
    }
  }
}

impl<T> RcDeref for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref(&self) -> Self::Target<'_> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T> RcDerefMut for MutArc<T> {
  type Target<'a>
    = MutexGuard<'a, T>
  where
    Self: 'a;

  #[inline]
  fn rc_deref_mut(&self) -> Self::Target<'_> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

/// A shared observer slot. `None` means the observer has terminated or was
/// released; terminal events take the observer out before delivering so the
/// lock is never held across `error`/`complete`.
impl<Item, Err, O> Observer<Item, Err> for MutArc<Option<O>>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.rc_deref_mut().as_mut() {
      observer.next(value);
    }
  }

  fn error(self, err: Err) {
    let observer = self.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    let observer = self.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn is_finished(&self) -> bool {
    self.rc_deref().as_ref().map_or(true, |o| o.is_finished())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn shared_slot_releases_after_complete() {
    let hits = MutArc::own(0);
    let c_hits = hits.clone();
    let observer = crate::observer::FnMutObserver(move |v: i32| {
      *c_hits.rc_deref_mut() += v;
    });
    let mut slot = MutArc::own(Some(observer));
    let c_slot = slot.clone();

    Observer::<i32, std::convert::Infallible>::next(&mut slot, 1);
    Observer::<i32, std::convert::Infallible>::next(&mut slot, 2);
    Observer::<i32, std::convert::Infallible>::complete(slot);

    assert_eq!(*hits.rc_deref(), 3);
    assert!(Observer::<i32, std::convert::Infallible>::is_finished(&c_slot));
  }

  #[test]
  fn ptr_eq_tracks_clones() {
    let a = MutArc::own(1);
    let b = a.clone();
    let c = MutArc::own(1);
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&c));
  }

  #[test]
  fn try_lock_skips_held_cell() {
    let cell = MutArc::own(1);
    let guard = cell.rc_deref_mut();
    assert!(cell.try_rc_deref_mut().is_none());
    drop(guard);
    assert_eq!(cell.try_rc_deref_mut().map(|v| *v), Some(1));
  }
}
