use super::{Retention, Subject};

/// Keeps only the latest value and releases it on completion.
#[derive(Clone, Debug)]
pub struct AsyncLast<Item> {
  last: Option<Item>,
}

impl<Item> Default for AsyncLast<Item> {
  fn default() -> Self { AsyncLast { last: None } }
}

impl<Item: Clone> Retention<Item> for AsyncLast<Item> {
  fn record(&mut self, value: &Item) -> bool {
    self.last = Some(value.clone());
    false
  }

  fn replay(&self) -> Vec<Item> { Vec::new() }

  fn on_complete(&self) -> Vec<Item> { self.last.iter().cloned().collect() }

  fn replay_terminated(&self, completed: bool) -> Vec<Item> {
    if completed { self.on_complete() } else { Vec::new() }
  }
}

/// A subject that emits nothing until it completes, then delivers its last
/// value followed by completion to every subscriber, past and future. An
/// error is delivered alone.
pub type AsyncSubject<Item, Err> = Subject<Item, Err, AsyncLast<Item>>;

impl<Item, Err> Subject<Item, Err, AsyncLast<Item>> {
  pub fn new() -> Self { Self::with_retention(AsyncLast::default()) }
}

impl<Item, Err> Default for Subject<Item, Err, AsyncLast<Item>> {
  fn default() -> Self { Self::new() }
}
