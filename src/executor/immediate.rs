use std::time::Duration;

use crate::error::RxError;

use super::{Executor, TaskHandle};

/// Runs every task on the calling thread, right away.
///
/// `run_after` sleeps the calling thread for the delay first, so it is only
/// suitable for tests and short scripts.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateExecutor;

impl Executor for ImmediateExecutor {
  fn run_async<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    task();
    TaskHandle::finished()
  }

  fn run_after<F>(&self, delay: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    std::thread::sleep(delay);
    task();
    TaskHandle::finished()
  }

  fn run_sync<F, R>(&self, task: F) -> Result<R, RxError>
  where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
  {
    Ok(task())
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::subscription::Subscription;
  use std::sync::{Arc, Mutex};

  #[test]
  fn runs_inline() {
    let hits = Arc::new(Mutex::new(vec![]));
    let c_hits = hits.clone();
    let handle = ImmediateExecutor.run_async(move || c_hits.lock().unwrap().push(1));
    hits.lock().unwrap().push(2);

    assert_eq!(*hits.lock().unwrap(), vec![1, 2]);
    assert!(handle.is_closed());
    assert_eq!(ImmediateExecutor.run_sync(|| 40 + 2), Ok(42));
  }
}
