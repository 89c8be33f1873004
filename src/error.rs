use std::{convert::Infallible, fmt::Display};

use thiserror::Error;

/// Errors raised by the library itself, as opposed to errors a producer
/// chooses to emit through its own `Err` type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RxError {
  /// An error raised by a producer and forwarded unchanged.
  #[error("upstream error: {0}")]
  Upstream(String),
  /// A user supplied function failed while an operator evaluated it.
  #[error("transform failed: {0}")]
  TransformFailure(String),
  /// `element_at` reached the end of the sequence before the index.
  #[error("element {index} requested, but the sequence completed after {count} elements")]
  InsufficientElements { index: usize, count: usize },
  /// A task handed to an executor was dropped before it produced a result.
  #[error("task was cancelled before it completed")]
  Cancelled,
  /// An executor could not be built or has been shut down.
  #[error("executor unavailable: {0}")]
  ExecutorUnavailable(String),
  /// A main queue was drained from a thread other than its owner.
  #[error("main queue drained from a thread that does not own it")]
  NotMainThread,
}

impl RxError {
  /// Wraps any displayable producer error as an `Upstream` error.
  pub fn upstream(err: impl Display) -> Self { RxError::Upstream(err.to_string()) }
}

impl From<Infallible> for RxError {
  fn from(err: Infallible) -> Self { match err {} }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn messages() {
    let err = RxError::InsufficientElements { index: 7, count: 5 };
    assert_eq!(
      err.to_string(),
      "element 7 requested, but the sequence completed after 5 elements"
    );
    assert_eq!(
      RxError::upstream("boom").to_string(),
      "upstream error: boom"
    );
  }
}
