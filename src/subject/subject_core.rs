use std::{
  cell::RefCell,
  collections::VecDeque,
  rc::{Rc, Weak},
};

use super::{
  subject_subscription::SubjectSubscription,
  subscribers::{
    broadcast_complete, broadcast_error, broadcast_value, SubjectObserver, Subscribers,
  },
};
use crate::{
  notification::Notification,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
};

// ============================================================================
// Core state
// ============================================================================

pub(crate) enum SubjectState<Err> {
  Active,
  Completed,
  Errored(Err),
}

/// A broadcast waiting for the running one to finish, with the subscribers
/// that were attached when it was pushed.
struct Pending<Item, Err> {
  notification: Notification<Item, Err>,
  observers: Vec<SubjectObserver<Item, Err>>,
}

pub(crate) struct SubjectCore<Item, Err> {
  pub(crate) subscribers: Subscribers<Item, Err>,
  pub(crate) state: SubjectState<Err>,
  emitting: bool,
  pending: VecDeque<Pending<Item, Err>>,
}

// ============================================================================
// Subject
// ============================================================================

/// A hot multicast source that is also an observer.
///
/// Values pushed with [`next`](Observer::next) reach every current subscriber
/// in subscription order. A push made from inside a subscriber callback waits
/// until the running broadcast has reached every subscriber, so all of them
/// see values in push order. After `error` or `complete` the subject is
/// terminated: later pushes are ignored (and logged at `warn` level) and late
/// subscribers receive the terminal notification straight away.
///
/// Clones share the same subscriber list.
///
/// ```rust
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let subject = Subject::<i32, ()>::new();
/// let c_seen = seen.clone();
/// subject.clone().subscribe(move |v| c_seen.borrow_mut().push(v));
/// subject.clone().next(1);
/// subject.clone().next(2);
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub struct Subject<Item, Err> {
  pub(crate) core: Rc<RefCell<SubjectCore<Item, Err>>>,
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self {
    Self {
      core: Rc::new(RefCell::new(SubjectCore {
        subscribers: Subscribers::default(),
        state: SubjectState::Active,
        emitting: false,
        pending: VecDeque::new(),
      })),
    }
  }

  /// Number of subscribers currently attached.
  pub fn subscriber_count(&self) -> usize { self.core.borrow().subscribers.len() }

  /// Whether `error` or `complete` has been pushed.
  pub fn is_terminated(&self) -> bool {
    !matches!(self.core.borrow().state, SubjectState::Active)
  }

  fn weak(&self) -> Weak<RefCell<SubjectCore<Item, Err>>> { Rc::downgrade(&self.core) }

  /// Moves the subject into a terminal state. Hands back the observers to
  /// notify now, or `None` when the subject had already terminated or a
  /// broadcast is running and the terminal notification was queued behind it.
  fn terminate(
    &self, state: SubjectState<Err>, terminal: Notification<Item, Err>,
  ) -> Option<Vec<SubjectObserver<Item, Err>>> {
    let mut core = self.core.borrow_mut();
    if !matches!(core.state, SubjectState::Active) {
      tracing::warn!("terminal notification pushed into a terminated subject, ignored");
      return None;
    }
    core.state = state;
    let observers = core.subscribers.drain();
    if core.emitting {
      core.pending.push_back(Pending { notification: terminal, observers });
      return None;
    }
    Some(observers)
  }

  /// Completes the subject. Usable where `Item` is not `Clone`.
  pub(crate) fn close(&self) {
    if let Some(observers) = self.terminate(SubjectState::Completed, Notification::Completed) {
      broadcast_complete(observers);
    }
  }
}

impl<Item, Err> Subject<Item, Err>
where
  Item: 'static,
  Err: Clone + 'static,
{
  /// Attaches `subscriber`, then delivers `replay` followed by the terminal
  /// notification if the subject has already terminated.
  ///
  /// The replay goes out as a single batch, so a value pushed re-entrantly
  /// while it is running is queued behind it.
  pub(crate) fn attach<O>(
    &self, subscriber: Subscriber<O, Item, Err>, replay: Vec<Item>,
  ) -> SubjectSubscription<Item, Err>
  where
    O: Observer<Item, Err> + 'static,
  {
    let handle = subscriber.handle();
    let (id, terminal) = {
      let mut core = self.core.borrow_mut();
      match &core.state {
        SubjectState::Active => (Some(core.subscribers.add(Rc::new(subscriber.clone()))), None),
        SubjectState::Completed => (None, Some(Notification::Completed)),
        SubjectState::Errored(err) => (None, Some(Notification::Error(err.clone()))),
      }
    };
    if !replay.is_empty() || terminal.is_some() {
      subscriber.deliver_all(replay.into_iter().map(Notification::Next).chain(terminal));
    }
    SubjectSubscription { core: self.weak(), id, handle }
  }
}

impl<Item, Err> Subject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  /// Runs the broadcasts queued while one was in progress, oldest first.
  fn drain_pending(&self) {
    loop {
      let pending = {
        let mut core = self.core.borrow_mut();
        let Some(pending) = core.pending.pop_front() else {
          core.emitting = false;
          return;
        };
        pending
      };
      let Pending { notification, observers } = pending;
      match notification {
        Notification::Next(value) => broadcast_value(observers, value),
        Notification::Error(err) => broadcast_error(observers, err),
        Notification::Completed => broadcast_complete(observers),
      }
    }
  }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn next(&mut self, value: Item) {
    let observers = {
      let mut core = self.core.borrow_mut();
      if !matches!(core.state, SubjectState::Active) {
        tracing::warn!("value pushed into a terminated subject, ignored");
        return;
      }
      let observers = core.subscribers.snapshot();
      if core.emitting {
        core
          .pending
          .push_back(Pending { notification: Notification::Next(value), observers });
        return;
      }
      core.emitting = true;
      observers
    };
    broadcast_value(observers, value);
    self.drain_pending();
  }

  fn error(self, err: Err) {
    let terminal = Notification::Error(err.clone());
    if let Some(observers) = self.terminate(SubjectState::Errored(err.clone()), terminal) {
      broadcast_error(observers, err);
    }
  }

  #[inline]
  fn complete(self) { self.close() }

  fn is_closed(&self) -> bool { self.is_terminated() }
}

impl<Item, Err> Observable for Subject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + 'static,
  {
    self.attach(Subscriber::new(observer), vec![])
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[rxlite_macro::test]
  fn broadcasts_in_subscription_order() {
    let log = Rc::new(RefCell::new(vec![]));
    let subject = Subject::<i32, ()>::new();
    let (l1, l2) = (log.clone(), log.clone());
    subject.clone().subscribe(move |v| l1.borrow_mut().push(("a", v)));
    subject.clone().subscribe(move |v| l2.borrow_mut().push(("b", v)));
    subject.clone().next(1);
    subject.clone().next(2);
    assert_eq!(*log.borrow(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
  }

  #[rxlite_macro::test]
  fn push_after_terminal_is_ignored() {
    let log = Rc::new(RefCell::new(vec![]));
    let subject = Subject::<i32, &str>::new();
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    subject.clone().subscribe_all(
      move |v| l1.borrow_mut().push(format!("next {v}")),
      move |e| l2.borrow_mut().push(format!("error {e}")),
      move || l3.borrow_mut().push("complete".to_owned()),
    );
    subject.clone().next(1);
    subject.clone().complete();
    subject.clone().next(2);
    subject.clone().error("late");
    assert_eq!(*log.borrow(), vec!["next 1", "complete"]);
    assert!(subject.is_terminated());
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[rxlite_macro::test]
  fn late_subscriber_gets_terminal() {
    let subject = Subject::<i32, &str>::new();
    subject.clone().error("boom");
    let got = Rc::new(RefCell::new(None));
    let c_got = got.clone();
    subject
      .clone()
      .subscribe_err(|_| panic!("no values"), move |e| *c_got.borrow_mut() = Some(e));
    assert_eq!(*got.borrow(), Some("boom"));
  }

  #[rxlite_macro::test]
  fn unsubscribe_removes_subscriber() {
    let subject = Subject::<i32, ()>::new();
    let hits = Rc::new(RefCell::new(0));
    let c_hits = hits.clone();
    let sub = subject
      .clone()
      .subscribe(move |_| *c_hits.borrow_mut() += 1);
    assert_eq!(subject.subscriber_count(), 1);
    subject.clone().next(1);
    sub.unsubscribe();
    assert_eq!(subject.subscriber_count(), 0);
    subject.clone().next(2);
    assert_eq!(*hits.borrow(), 1);
  }

  #[rxlite_macro::test]
  fn unsubscribe_during_broadcast_skips_later_delivery() {
    let subject = Subject::<i32, ()>::new();
    let log = Rc::new(RefCell::new(vec![]));
    let second: Rc<RefCell<Option<SubscribeHandle<SubjectSubscription<i32, ()>>>>> =
      Rc::new(RefCell::new(None));

    let (c_log, c_second) = (log.clone(), second.clone());
    subject.clone().subscribe(move |v| {
      c_log.borrow_mut().push(("a", v));
      if let Some(s) = c_second.borrow_mut().take() {
        s.unsubscribe();
      }
    });
    let c_log = log.clone();
    *second.borrow_mut() =
      Some(subject.clone().subscribe(move |v| c_log.borrow_mut().push(("b", v))));

    subject.clone().next(1);
    assert_eq!(*log.borrow(), vec![("a", 1)]);
  }

  #[rxlite_macro::test]
  fn subscribe_inside_callback_misses_current_value() {
    let subject = Subject::<i32, ()>::new();
    let log = Rc::new(RefCell::new(vec![]));
    let (c_log, c_subject) = (log.clone(), subject.clone());
    let once = Rc::new(RefCell::new(true));
    subject.clone().subscribe(move |_| {
      if once.replace(false) {
        let l = c_log.clone();
        c_subject
          .clone()
          .subscribe(move |v| l.borrow_mut().push(v));
      }
    });
    subject.clone().next(1);
    subject.clone().next(2);
    assert_eq!(*log.borrow(), vec![2]);
  }

  #[rxlite_macro::test]
  fn push_inside_callback_reaches_every_subscriber_in_order() {
    let subject = Subject::<i32, ()>::new();
    let log = Rc::new(RefCell::new(vec![]));
    let (c_log, mut c_subject) = (log.clone(), subject.clone());
    subject.clone().subscribe(move |v| {
      c_log.borrow_mut().push(("a", v));
      if v == 1 {
        c_subject.next(2);
      }
    });
    let c_log = log.clone();
    subject
      .clone()
      .subscribe(move |v| c_log.borrow_mut().push(("b", v)));

    subject.clone().next(1);
    assert_eq!(*log.borrow(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
  }

  #[rxlite_macro::test]
  fn terminal_pushed_inside_callback_follows_the_running_value() {
    let subject = Subject::<i32, ()>::new();
    let log = Rc::new(RefCell::new(vec![]));
    let (c_log, c_subject) = (log.clone(), subject.clone());
    subject.clone().subscribe_all(
      move |v| {
        c_log.borrow_mut().push(format!("a {v}"));
        c_subject.clone().complete();
      },
      |_| {},
      || {},
    );
    let (l1, l2) = (log.clone(), log.clone());
    subject.clone().subscribe_all(
      move |v| l1.borrow_mut().push(format!("b {v}")),
      |_| {},
      move || l2.borrow_mut().push("b complete".to_owned()),
    );

    subject.clone().next(1);
    assert_eq!(*log.borrow(), vec!["a 1", "b 1", "b complete"]);
    assert!(subject.is_terminated());
    assert_eq!(subject.subscriber_count(), 0);
  }
}
