//! The closable, re-entrancy safe observer cell.
//!
//! Every user-facing entry point (`subscribe*`, subjects, `observe_on`) wraps
//! the downstream observer in a [`Subscriber`]. It gives three guarantees the
//! plain [`Observer`] trait cannot:
//!
//! - **Closing is synchronous.** Once [`Subscriber::close`] returns (or any
//!   [`SubscriberHandle`] is unsubscribed) the observer never sees another
//!   callback, even if the close happened inside one of its own callbacks.
//! - **Re-entrant delivery is serialized.** A notification that arrives while
//!   the observer is already running (a callback pushing into the subject it
//!   listens to, for example) is queued and delivered after the running
//!   callback returns, so one observer always sees events in push order.
//! - **No interior borrow is held across a callback.** The observer is moved
//!   out of its slot while it runs, so subscribing, unsubscribing or pushing
//!   from inside a callback can never hit a `RefCell` double borrow.

use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  rc::Rc,
};

use crate::{notification::Notification, observer::Observer, subscription::Subscription};

pub struct Subscriber<O, Item, Err> {
  inner: Rc<SubscriberInner<O, Item, Err>>,
}

struct SubscriberInner<O, Item, Err> {
  observer: RefCell<Option<O>>,
  queue: RefCell<VecDeque<Notification<Item, Err>>>,
  closed: Cell<bool>,
  draining: Cell<bool>,
}

impl<O, Item, Err> Clone for Subscriber<O, Item, Err> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<O, Item, Err> Subscriber<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  pub fn new(observer: O) -> Self {
    Self {
      inner: Rc::new(SubscriberInner {
        observer: RefCell::new(Some(observer)),
        queue: RefCell::new(VecDeque::new()),
        closed: Cell::new(false),
        draining: Cell::new(false),
      }),
    }
  }

  /// Delivers one notification, or queues it if the observer is busy.
  #[inline]
  pub fn deliver(&self, notification: Notification<Item, Err>) {
    self.deliver_all(std::iter::once(notification))
  }

  /// Delivers a batch as one unit: nothing pushed re-entrantly while the
  /// batch is running can slip in between its items.
  pub fn deliver_all(&self, notifications: impl IntoIterator<Item = Notification<Item, Err>>) {
    if self.inner.closed.get() {
      return;
    }
    self
      .inner
      .queue
      .borrow_mut()
      .extend(notifications);
    if self.inner.draining.replace(true) {
      // An outer call on the stack is draining and will pick these up.
      return;
    }
    self.drain();
    self.inner.draining.set(false);
  }

  fn drain(&self) {
    loop {
      let Some(notification) = self.inner.queue.borrow_mut().pop_front() else {
        break;
      };
      if notification.is_terminal() {
        self.inner.closed.set(true);
        self.inner.queue.borrow_mut().clear();
      }
      let Some(observer) = self.inner.observer.borrow_mut().take() else {
        self.inner.queue.borrow_mut().clear();
        break;
      };
      let observer = notification.accept(observer);
      if self.inner.closed.get() {
        // Closed from inside the callback (or terminal): drop the observer.
        drop(observer);
        self.inner.queue.borrow_mut().clear();
        break;
      }
      *self.inner.observer.borrow_mut() = observer;
    }
  }

  /// Closes the subscriber: the observer is dropped and nothing else is
  /// delivered. Idempotent.
  pub fn close(&self) { self.inner.close(); }
}

impl<O, Item, Err> Subscriber<O, Item, Err>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: 'static,
{
  /// A type-erased handle that closes this subscriber.
  pub fn handle(&self) -> SubscriberHandle { SubscriberHandle(self.inner.clone()) }
}

impl<O, Item, Err> Observer<Item, Err> for Subscriber<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.deliver(Notification::Next(value)) }

  #[inline]
  fn error(self, err: Err) { self.deliver(Notification::Error(err)) }

  #[inline]
  fn complete(self) { self.deliver(Notification::Completed) }

  fn is_closed(&self) -> bool {
    if self.inner.closed.get() {
      return true;
    }
    // While the observer runs it is out of its slot; report it open.
    self
      .inner
      .observer
      .try_borrow()
      .map_or(false, |o| o.as_ref().is_some_and(Observer::is_closed))
  }
}

impl<O, Item, Err> Subscription for Subscriber<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn unsubscribe(self) { self.close() }

  #[inline]
  fn is_closed(&self) -> bool { self.inner.closed.get() }
}

// ============================================================================
// Publisher - what a subject stores
// ============================================================================

/// Object-safe view of a subscriber, as stored by subjects.
pub trait Publisher<Item, Err> {
  fn publish(&self, notification: Notification<Item, Err>);

  fn publish_all(&self, notifications: Vec<Notification<Item, Err>>);

  fn is_closed(&self) -> bool;
}

impl<O, Item, Err> Publisher<Item, Err> for Subscriber<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn publish(&self, notification: Notification<Item, Err>) { self.deliver(notification) }

  #[inline]
  fn publish_all(&self, notifications: Vec<Notification<Item, Err>>) {
    self.deliver_all(notifications)
  }

  #[inline]
  fn is_closed(&self) -> bool { Observer::is_closed(self) }
}

// ============================================================================
// SubscriberHandle
// ============================================================================

trait Close {
  fn close(&self);
  fn is_closed(&self) -> bool;
}

impl<O, Item, Err> Close for SubscriberInner<O, Item, Err> {
  fn close(&self) {
    if self.closed.replace(true) {
      return;
    }
    self.queue.borrow_mut().clear();
    let observer = self.observer.borrow_mut().take();
    drop(observer);
  }

  fn is_closed(&self) -> bool { self.closed.get() }
}

/// Type-erased handle closing one [`Subscriber`].
#[derive(Clone)]
pub struct SubscriberHandle(Rc<dyn Close>);

impl Subscription for SubscriberHandle {
  #[inline]
  fn unsubscribe(self) { self.0.close() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::observer::FnObserver;

  fn recorder(
    log: Rc<RefCell<Vec<String>>>,
  ) -> FnObserver<impl FnMut(i32), impl FnOnce(&'static str), impl FnOnce()> {
    let (l1, l2, l3) = (log.clone(), log.clone(), log);
    FnObserver {
      next: move |v: i32| l1.borrow_mut().push(format!("next {v}")),
      error: move |e: &'static str| l2.borrow_mut().push(format!("error {e}")),
      complete: move || l3.borrow_mut().push("complete".to_owned()),
    }
  }

  #[rxlite_macro::test]
  fn nothing_after_terminal() {
    let log = Rc::new(RefCell::new(vec![]));
    let mut s = Subscriber::new(recorder(log.clone()));
    s.next(1);
    s.clone().complete();
    s.next(2);
    s.clone().error("late");
    assert_eq!(*log.borrow(), vec!["next 1", "complete"]);
    assert!(Subscription::is_closed(&s));
  }

  #[rxlite_macro::test]
  fn close_stops_delivery() {
    let log = Rc::new(RefCell::new(vec![]));
    let mut s = Subscriber::new(recorder(log.clone()));
    let handle = s.handle();
    s.next(1);
    handle.clone().unsubscribe();
    handle.unsubscribe();
    s.next(2);
    assert_eq!(*log.borrow(), vec!["next 1"]);
  }

  #[rxlite_macro::test]
  fn re_entrant_delivery_is_queued_in_order() {
    let log = Rc::new(RefCell::new(vec![]));
    let slot: Rc<RefCell<Option<Rc<dyn Publisher<i32, ()>>>>> = Rc::new(RefCell::new(None));
    let (c_log, c_slot) = (log.clone(), slot.clone());
    let s = Subscriber::new(FnObserver {
      next: move |v: i32| {
        c_log.borrow_mut().push(v);
        if v == 1 {
          let inner = c_slot.borrow().clone();
          if let Some(inner) = inner {
            inner.publish(Notification::Next(2));
            inner.publish(Notification::Next(3));
          }
        }
        c_log.borrow_mut().push(v * 10);
      },
      error: |_: ()| {},
      complete: || {},
    });
    *slot.borrow_mut() = Some(Rc::new(s.clone()));
    s.deliver(Notification::Next(1));
    assert_eq!(*log.borrow(), vec![1, 10, 2, 20, 3, 30]);
    slot.borrow_mut().take();
  }

  #[rxlite_macro::test]
  fn close_inside_callback_drops_queued_items() {
    let log = Rc::new(RefCell::new(vec![]));
    let handle: Rc<RefCell<Option<SubscriberHandle>>> = Rc::new(RefCell::new(None));
    let (c_log, c_handle) = (log.clone(), handle.clone());
    let s = Subscriber::new(FnObserver {
      next: move |v: i32| {
        c_log.borrow_mut().push(v);
        if let Some(h) = c_handle.borrow_mut().take() {
          h.unsubscribe();
        }
      },
      error: |_: ()| {},
      complete: || {},
    });
    *handle.borrow_mut() = Some(s.handle());
    s.deliver_all(vec![Notification::Next(1), Notification::Next(2)]);
    s.deliver(Notification::Next(3));
    assert_eq!(*log.borrow(), vec![1]);
  }
}
