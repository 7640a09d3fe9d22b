use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use super::{Subject, SubjectSubscription};
use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

struct ReplayBuffer<Item> {
  values: VecDeque<Item>,
  capacity: Option<usize>,
}

/// A subject that replays buffered values to every new subscriber, followed
/// by the terminal notification once it has terminated.
///
/// The buffer is unbounded by default; [`with_capacity`](Self::with_capacity)
/// keeps only the most recent `n` values.
pub struct ReplaySubject<Item, Err> {
  subject: Subject<Item, Err>,
  buffer: Rc<RefCell<ReplayBuffer<Item>>>,
}

impl<Item, Err> Clone for ReplaySubject<Item, Err> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone(), buffer: self.buffer.clone() } }
}

impl<Item, Err> Default for ReplaySubject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> ReplaySubject<Item, Err> {
  pub fn new() -> Self { Self::build(None) }

  pub fn with_capacity(capacity: usize) -> Self { Self::build(Some(capacity)) }

  /// Replays only the latest value.
  pub fn latest() -> Self { Self::with_capacity(1) }

  fn build(capacity: Option<usize>) -> Self {
    Self {
      subject: Subject::new(),
      buffer: Rc::new(RefCell::new(ReplayBuffer { values: VecDeque::new(), capacity })),
    }
  }

  #[inline]
  pub fn subscriber_count(&self) -> usize { self.subject.subscriber_count() }

  #[inline]
  pub fn is_terminated(&self) -> bool { self.subject.is_terminated() }
}

impl<Item, Err> Observer<Item, Err> for ReplaySubject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn next(&mut self, value: Item) {
    if !self.subject.is_terminated() {
      let mut buffer = self.buffer.borrow_mut();
      if buffer.capacity != Some(0) {
        if Some(buffer.values.len()) == buffer.capacity {
          buffer.values.pop_front();
        }
        buffer.values.push_back(value.clone());
      }
    }
    self.subject.next(value)
  }

  #[inline]
  fn error(self, err: Err) { self.subject.error(err) }

  #[inline]
  fn complete(self) { self.subject.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.subject.is_terminated() }
}

impl<Item, Err> Observable for ReplaySubject<Item, Err>
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
    let replay = self.buffer.borrow().values.iter().cloned().collect();
    self.subject.attach(Subscriber::new(observer), replay)
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  fn record(subject: &ReplaySubject<i32, &'static str>) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    subject.clone().subscribe_all(
      move |v| l1.borrow_mut().push(format!("next {v}")),
      move |e| l2.borrow_mut().push(format!("error {e}")),
      move || l3.borrow_mut().push("complete".to_owned()),
    );
    log
  }

  #[rxlite_macro::test]
  fn replays_everything_then_terminal() {
    let subject = ReplaySubject::<i32, &str>::new();
    subject.clone().next(1);
    subject.clone().next(2);
    subject.clone().error("boom");
    assert_eq!(*record(&subject).borrow(), vec!["next 1", "next 2", "error boom"]);
  }

  #[rxlite_macro::test]
  fn bounded_buffer_keeps_latest() {
    let subject = ReplaySubject::<i32, &str>::latest();
    subject.clone().next(1);
    subject.clone().next(2);
    let log = record(&subject);
    subject.clone().next(3);
    subject.clone().complete();
    assert_eq!(*log.borrow(), vec!["next 2", "next 3", "complete"]);
    assert_eq!(*record(&subject).borrow(), vec!["next 3", "complete"]);
  }

  #[rxlite_macro::test]
  fn every_subscriber_sees_the_same_result() {
    let subject = ReplaySubject::<i32, &str>::with_capacity(4);
    let early = record(&subject);
    subject.clone().next(42);
    subject.clone().complete();
    let late = record(&subject);
    assert_eq!(*early.borrow(), *late.borrow());
  }

  #[rxlite_macro::test]
  fn push_inside_callback_keeps_order_for_later_subscribers() {
    let subject = ReplaySubject::<i32, &str>::new();
    let (c_subject, other) = (subject.clone(), Rc::new(RefCell::new(vec![])));
    subject.clone().subscribe(move |v| {
      if v == 1 {
        c_subject.clone().next(2);
      }
    });
    let c_other = other.clone();
    subject
      .clone()
      .subscribe(move |v| c_other.borrow_mut().push(v));

    subject.clone().next(1);
    subject.clone().complete();
    assert_eq!(*other.borrow(), vec![1, 2]);
    assert_eq!(*record(&subject).borrow(), vec!["next 1", "next 2", "complete"]);
  }
}
