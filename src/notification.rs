//! Materialized observer events.
//!
//! A [`Notification`] is one `next`, `error` or `complete` call captured as a
//! value. Subscribers queue them while a callback is running and the
//! [`TestScheduler`](crate::scheduler::TestScheduler) records them with their
//! virtual timestamps.

use crate::observer::Observer;

/// One observer event captured as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Completed,
}

impl<Item, Err> Notification<Item, Err> {
  /// Returns `true` for `Error` and `Completed`.
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  /// The carried value, if this is a `Next`.
  pub fn value(&self) -> Option<&Item> {
    match self {
      Notification::Next(v) => Some(v),
      _ => None,
    }
  }

  /// The carried error, if this is an `Error`.
  pub fn err(&self) -> Option<&Err> {
    match self {
      Notification::Error(e) => Some(e),
      _ => None,
    }
  }

  /// Replays this notification into `observer`.
  ///
  /// Terminal notifications consume the observer, so this returns it back
  /// only for `Next`.
  pub fn accept<O>(self, mut observer: O) -> Option<O>
  where
    O: Observer<Item, Err>,
  {
    match self {
      Notification::Next(v) => {
        observer.next(v);
        Some(observer)
      }
      Notification::Error(e) => {
        observer.error(e);
        None
      }
      Notification::Completed => {
        observer.complete();
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxlite_macro::test]
  fn terminal_detection() {
    assert!(!Notification::<i32, ()>::Next(1).is_terminal());
    assert!(Notification::<i32, ()>::Error(()).is_terminal());
    assert!(Notification::<i32, ()>::Completed.is_terminal());
  }

  #[rxlite_macro::test]
  fn accessors() {
    let n = Notification::<i32, &str>::Next(3);
    assert_eq!(n.value(), Some(&3));
    assert_eq!(n.err(), None);
    let e = Notification::<i32, &str>::Error("boom");
    assert_eq!(e.err(), Some(&"boom"));
  }
}
