use std::{cell::RefCell, rc::Rc};

use super::{Subject, SubjectSubscription};
use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

/// A subject that remembers the last value pushed into it.
///
/// A new subscriber receives the stored value (if there is one) before any
/// later push. Once the subject has terminated, late subscribers get only the
/// terminal notification.
pub struct BehaviorSubject<Item, Err> {
  pub(crate) subject: Subject<Item, Err>,
  pub(crate) value: Rc<RefCell<Option<Item>>>,
}

impl<Item, Err> Clone for BehaviorSubject<Item, Err> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone(), value: self.value.clone() } }
}

impl<Item, Err> BehaviorSubject<Item, Err> {
  #[inline]
  pub fn new(value: Item) -> Self {
    Self { subject: Subject::new(), value: Rc::new(RefCell::new(Some(value))) }
  }

  /// A behavior subject with no value yet.
  #[inline]
  pub fn empty() -> Self { Self { subject: Subject::new(), value: Rc::new(RefCell::new(None)) } }

  /// The stored value, read without subscribing.
  pub fn value(&self) -> Option<Item>
  where
    Item: Clone,
  {
    self.value.borrow().clone()
  }

  #[inline]
  pub fn subscriber_count(&self) -> usize { self.subject.subscriber_count() }

  #[inline]
  pub fn is_terminated(&self) -> bool { self.subject.is_terminated() }
}

impl<Item, Err> Observer<Item, Err> for BehaviorSubject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn next(&mut self, value: Item) {
    if !self.subject.is_terminated() {
      *self.value.borrow_mut() = Some(value.clone());
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

impl<Item, Err> Observable for BehaviorSubject<Item, Err>
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
    let replay = if self.subject.is_terminated() {
      vec![]
    } else {
      self.value.borrow().iter().cloned().collect()
    };
    self.subject.attach(Subscriber::new(observer), replay)
  }
}
