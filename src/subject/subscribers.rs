use std::rc::Rc;

use crate::{notification::Notification, subscriber::Publisher};

pub(crate) type SubjectObserver<Item, Err> = Rc<dyn Publisher<Item, Err>>;

/// Subscribers container with id-based removal.
///
/// Broadcasting never iterates the live list: callers take a
/// [`snapshot`](Subscribers::snapshot) under the borrow, release it, then
/// deliver. Subscribing or unsubscribing from inside a callback therefore
/// only touches the live list, never the one being walked.
pub(crate) struct Subscribers<Item, Err> {
  next_id: usize,
  inner: Vec<(usize, SubjectObserver<Item, Err>)>,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Self { next_id: 0, inner: vec![] } }
}

impl<Item, Err> Subscribers<Item, Err> {
  /// Add an observer and return its unique ID.
  pub(crate) fn add(&mut self, observer: SubjectObserver<Item, Err>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.inner.push((id, observer));
    id
  }

  /// Remove an observer by ID.
  pub(crate) fn remove(&mut self, id: usize) -> Option<SubjectObserver<Item, Err>> {
    let idx = self.inner.iter().position(|(i, _)| *i == id)?;
    Some(self.inner.remove(idx).1)
  }

  /// Number of observers still accepting notifications.
  pub(crate) fn len(&self) -> usize { self.inner.iter().filter(|(_, o)| !o.is_closed()).count() }

  /// Drops closed observers and returns the rest in subscription order.
  pub(crate) fn snapshot(&mut self) -> Vec<SubjectObserver<Item, Err>> {
    self.inner.retain(|(_, o)| !o.is_closed());
    self.inner.iter().map(|(_, o)| o.clone()).collect()
  }

  /// Empties the container, returning every observer.
  pub(crate) fn drain(&mut self) -> Vec<SubjectObserver<Item, Err>> {
    self.inner.drain(..).map(|(_, o)| o).collect()
  }
}

/// Delivers `value` to every observer, cloning for all but the last one,
/// which receives the moved value.
pub(crate) fn broadcast_value<Item: Clone, Err>(
  observers: Vec<SubjectObserver<Item, Err>>, value: Item,
) {
  let mut iter = observers.into_iter().peekable();
  while let Some(observer) = iter.next() {
    if iter.peek().is_some() {
      observer.publish(Notification::Next(value.clone()));
    } else {
      observer.publish(Notification::Next(value));
      break;
    }
  }
}

pub(crate) fn broadcast_error<Item, Err: Clone>(
  observers: Vec<SubjectObserver<Item, Err>>, err: Err,
) {
  for observer in observers {
    observer.publish(Notification::Error(err.clone()));
  }
}

pub(crate) fn broadcast_complete<Item, Err>(observers: Vec<SubjectObserver<Item, Err>>) {
  for observer in observers {
    observer.publish(Notification::Completed);
  }
}
