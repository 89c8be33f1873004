use super::{Retention, Subject};

/// Keeps nothing: subscribers see only values pushed after they joined.
#[derive(Clone, Copy, Debug, Default)]
pub struct Publish;

impl<Item> Retention<Item> for Publish {
  #[inline]
  fn record(&mut self, _: &Item) -> bool { true }

  #[inline]
  fn replay(&self) -> Vec<Item> { Vec::new() }

  #[inline]
  fn replay_terminated(&self, _: bool) -> Vec<Item> { Vec::new() }
}

pub type PublishSubject<Item, Err> = Subject<Item, Err, Publish>;

impl<Item, Err> Subject<Item, Err, Publish> {
  pub fn new() -> Self { Self::with_retention(Publish) }
}

impl<Item, Err> Default for Subject<Item, Err, Publish> {
  fn default() -> Self { Self::new() }
}
